use super::zipcodes::lookup_zip_code;
use crate::app::ports::HttpClientPort;
use crate::config::GeocodingConfig;
use crate::error::{Result, ScraperError};
use crate::observability::metrics;
use crate::types::{GeoPoint, LocationSuggestion};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Instant suggestions, checked before any network lookup.
pub const COMMON_CITIES: [(&str, f64, f64); 28] = [
    ("Alpharetta, GA", 34.0289, -84.1986),
    ("Atlanta, GA", 33.7490, -84.3880),
    ("Los Angeles, CA", 34.0522, -118.2437),
    ("New York, NY", 40.7128, -74.0060),
    ("Chicago, IL", 41.8781, -87.6298),
    ("Houston, TX", 29.7604, -95.3698),
    ("Phoenix, AZ", 33.4484, -112.0740),
    ("San Antonio, TX", 29.4241, -98.4936),
    ("Dallas, TX", 32.7767, -96.7970),
    ("San Francisco, CA", 37.7749, -122.4194),
    ("Seattle, WA", 47.6062, -122.3321),
    ("Denver, CO", 39.7392, -104.9903),
    ("Boston, MA", 42.3601, -71.0589),
    ("Miami, FL", 25.7617, -80.1918),
    ("Tempe, AZ", 33.4152, -111.8315),
    ("Marietta, GA", 34.0195, -84.3612),
    ("Athens, GA", 33.9519, -83.3576),
    ("Suwanee, GA", 34.0712, -84.0710),
    ("Duluth, GA", 34.0234, -84.1435),
    ("Roswell, GA", 34.0265, -84.2305),
    ("Johns Creek, GA", 34.0126, -84.0679),
    ("London, UK", 51.5074, -0.1278),
    ("Paris, France", 48.8566, 2.3522),
    ("Tokyo, Japan", 35.6762, 139.6503),
    ("Vancouver, Canada", 49.2827, -123.1207),
    ("Toronto, Canada", 43.6532, -79.3832),
    ("Sydney, Australia", -33.8688, 151.2093),
    ("Berlin, Germany", 52.5200, 13.4050),
];

/// Minimum query length before a place-name lookup is worth a request.
const MIN_REMOTE_SUGGESTION_LEN: usize = 3;

#[derive(Debug, Deserialize)]
struct CensusResponse {
    #[serde(default)]
    result: Option<CensusResult>,
}

#[derive(Debug, Deserialize)]
struct CensusResult {
    #[serde(rename = "addressMatches", default)]
    address_matches: Vec<CensusMatch>,
}

#[derive(Debug, Deserialize)]
struct CensusMatch {
    #[serde(rename = "matchedAddress")]
    matched_address: String,
    coordinates: CensusCoordinates,
}

#[derive(Debug, Deserialize)]
struct CensusCoordinates {
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl NominatimPlace {
    fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.lat.parse().ok()?, self.lon.parse().ok()?))
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Free-text location resolution: bundled zip table, then the Census
/// address geocoder, then Nominatim. Lookups fail soft to `None`.
pub struct Geocoder {
    http: Arc<dyn HttpClientPort>,
    config: GeocodingConfig,
    max_suggestions: usize,
}

impl Geocoder {
    pub fn new(http: Arc<dyn HttpClientPort>, config: GeocodingConfig, max_suggestions: usize) -> Self {
        Self {
            http,
            config,
            max_suggestions,
        }
    }

    #[instrument(skip(self))]
    pub async fn geocode(&self, query: &str) -> Option<GeoPoint> {
        let query = query.trim();
        if query.chars().count() < 2 {
            return None;
        }

        if query.len() == 5 && is_digits(query) {
            if let Some(point) = lookup_zip_code(query) {
                metrics::geocoding::lookup("zip_table");
                return Some(point);
            }
        }

        if let Some(point) = self.geocode_with_census(query).await {
            metrics::geocoding::lookup("census");
            return Some(point);
        }

        if let Some(point) = self.geocode_with_nominatim(query).await {
            metrics::geocoding::lookup("nominatim");
            return Some(point);
        }

        debug!("No geocoder resolved {:?}", query);
        metrics::geocoding::miss();
        None
    }

    pub async fn geocode_with_census(&self, query: &str) -> Option<GeoPoint> {
        let url = Url::parse_with_params(
            &self.config.census_url,
            &[("address", query), ("benchmark", "Public_AR_Current"), ("format", "json")],
        )
        .ok()?;

        let response: CensusResponse = self.fetch_json(url.as_str(), "census").await?;
        let first = response.result?.address_matches.into_iter().next()?;
        Some(GeoPoint {
            lat: first.coordinates.y,
            lng: first.coordinates.x,
            display_name: first.matched_address,
        })
    }

    pub async fn geocode_with_nominatim(&self, query: &str) -> Option<GeoPoint> {
        let places = self.nominatim_search(query, 1).await?;
        places.into_iter().find_map(|place| {
            let (lat, lng) = place.coordinates()?;
            Some(GeoPoint {
                lat,
                lng,
                display_name: place.display_name,
            })
        })
    }

    /// Up to `max_suggestions` candidates for a partial query. Partial
    /// numeric input never goes to the network.
    #[instrument(skip(self))]
    pub async fn suggestions(&self, query: &str) -> Vec<LocationSuggestion> {
        let query = query.trim().to_lowercase();
        if query.chars().count() < 2 {
            return Vec::new();
        }

        if is_digits(&query) {
            if query.len() != 5 {
                return Vec::new();
            }
            return lookup_zip_code(&query)
                .map(|point| LocationSuggestion {
                    lat: point.lat,
                    lng: point.lng,
                    display_name: point.display_name,
                    kind: "zip code".to_string(),
                })
                .into_iter()
                .collect();
        }

        let common = common_city_suggestions(&query, self.max_suggestions);
        if !common.is_empty() || query.chars().count() < MIN_REMOTE_SUGGESTION_LEN {
            return common;
        }

        self.nominatim_search(&query, self.max_suggestions)
            .await
            .unwrap_or_default()
            .into_iter()
            .filter_map(|place| {
                let (lat, lng) = place.coordinates()?;
                Some(LocationSuggestion {
                    lat,
                    lng,
                    display_name: place.display_name,
                    kind: place.kind.unwrap_or_else(|| "place".to_string()),
                })
            })
            .take(self.max_suggestions)
            .collect()
    }

    async fn nominatim_search(&self, query: &str, limit: usize) -> Option<Vec<NominatimPlace>> {
        let limit = limit.to_string();
        let url = Url::parse_with_params(
            &self.config.nominatim_url,
            &[("q", query), ("format", "json"), ("limit", limit.as_str())],
        )
        .ok()?;
        self.fetch_json(url.as_str(), "nominatim").await
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str, provider: &str) -> Option<T> {
        match self.try_fetch_json(url).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("{} geocoder request failed: {}", provider, e);
                None
            }
        }
    }

    async fn try_fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let headers = [
            ("User-Agent", self.config.user_agent.clone()),
            ("Accept", "application/json".to_string()),
        ];
        let response = self.http.get(url, &headers).await?;
        if !response.is_success() {
            return Err(ScraperError::Status {
                status: response.status,
                url: url.to_string(),
            });
        }
        Ok(serde_json::from_slice(&response.bytes)?)
    }
}

/// Common cities whose display name contains the lower-cased query.
pub fn common_city_suggestions(query: &str, limit: usize) -> Vec<LocationSuggestion> {
    let needle = query.trim().to_lowercase();
    COMMON_CITIES
        .iter()
        .filter(|(name, _, _)| name.to_lowercase().contains(&needle))
        .take(limit)
        .map(|(name, lat, lng)| LocationSuggestion {
            lat: *lat,
            lng: *lng,
            display_name: name.to_string(),
            kind: "city".to_string(),
        })
        .collect()
}
