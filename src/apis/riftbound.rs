use super::models::{ApiEvent, EventsPage};
use crate::app::ports::{HttpClientPort, HttpGetResult};
use crate::config::ApiConfig;
use crate::constants::*;
use crate::error::{Result, ScraperError};
use crate::observability::metrics;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use reqwest::Url;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Geographic scope of an events query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchArea {
    Around { lat: f64, lng: f64, radius_miles: u32 },
    /// Continent-spanning center and radius, used for enrichment.
    Everywhere,
}

impl SearchArea {
    fn center_and_radius(&self) -> (f64, f64, u32) {
        match *self {
            SearchArea::Around { lat, lng, radius_miles } => (lat, lng, radius_miles),
            SearchArea::Everywhere => (FETCH_ALL_LATITUDE, FETCH_ALL_LONGITUDE, FETCH_ALL_RADIUS_MILES),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventQuery {
    pub area: SearchArea,
    pub page: u32,
    pub page_size: u32,
}

impl EventQuery {
    pub fn around(lat: f64, lng: f64, radius_miles: u32) -> Self {
        Self {
            area: SearchArea::Around { lat, lng, radius_miles },
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn everywhere() -> Self {
        Self {
            area: SearchArea::Everywhere,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

/// One decoded page. `raw_len` counts every record the server sent,
/// including ones dropped as malformed.
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    pub raw_len: usize,
    pub events: Vec<ApiEvent>,
}

/// Client for the public events API. Transport and decode failures are
/// logged and surface as an empty page or `None`; nothing here returns an
/// error to the caller.
#[derive(Clone)]
pub struct RiftboundClient {
    http: Arc<dyn HttpClientPort>,
    config: ApiConfig,
}

impl RiftboundClient {
    pub fn new(http: Arc<dyn HttpClientPort>, config: ApiConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Listing URL for `query`, with the rolling window anchored at `now`.
    pub fn events_url(&self, query: &EventQuery, now: DateTime<Utc>) -> Result<Url> {
        let (lat, lng, radius) = query.area.center_and_radius();
        let window_end = now + Duration::days(self.config.window_days);
        let params: Vec<(&str, String)> = vec![
            ("start_date_after", now.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ("start_date_before", window_end.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ("display_status", DISPLAY_STATUS_UPCOMING.to_string()),
            ("latitude", lat.to_string()),
            ("longitude", lng.to_string()),
            ("num_miles", radius.to_string()),
            ("upcoming_only", "true".to_string()),
            ("game_slug", self.config.game_slug.clone()),
            ("page", query.page.to_string()),
            ("page_size", query.page_size.to_string()),
        ];
        let base = format!("{}/events/", self.config.base_url.trim_end_matches('/'));
        Url::parse_with_params(&base, &params)
            .map_err(|e| ScraperError::Config(format!("invalid API base URL {}: {}", base, e)))
    }

    pub fn event_url(&self, id: u64) -> Result<Url> {
        let base = format!("{}/events/{}/", self.config.base_url.trim_end_matches('/'), id);
        Url::parse_with_params(&base, &[("game_slug", self.config.game_slug.as_str())])
            .map_err(|e| ScraperError::Config(format!("invalid API base URL {}: {}", base, e)))
    }

    /// One page of upcoming events. Empty on any failure.
    pub async fn fetch_events(&self, query: &EventQuery) -> Vec<ApiEvent> {
        self.fetch_page(query).await.events
    }

    #[instrument(skip(self), fields(page = query.page, page_size = query.page_size))]
    pub async fn fetch_page(&self, query: &EventQuery) -> FetchedPage {
        match self.try_fetch_page(query).await {
            Ok(page) => {
                metrics::api::request_success();
                page
            }
            Err(e) => {
                warn!("Events request failed: {}", e);
                metrics::api::request_error(error_kind(&e));
                FetchedPage::default()
            }
        }
    }

    async fn try_fetch_page(&self, query: &EventQuery) -> Result<FetchedPage> {
        let url = self.events_url(query, Utc::now())?;
        let response = self.get_json(url.as_str()).await?;
        let page: EventsPage = serde_json::from_slice(&response.bytes)?;
        let raw_len = page.results.len();
        debug!("Page {} returned {} raw records", query.page, raw_len);
        Ok(FetchedPage {
            raw_len,
            events: decode_records(page.results),
        })
    }

    /// Direct lookup. `None` when the id does not resolve to an upcoming
    /// event or the request fails.
    #[instrument(skip(self))]
    pub async fn fetch_event_by_id(&self, id: u64) -> Option<ApiEvent> {
        let result = async {
            let url = self.event_url(id)?;
            let response = self.get_json(url.as_str()).await?;
            Ok::<_, ScraperError>(serde_json::from_slice::<ApiEvent>(&response.bytes)?)
        }
        .await;

        match result {
            Ok(event) => {
                metrics::api::request_success();
                Some(event)
            }
            Err(ScraperError::Status { status: 404, .. }) => {
                debug!("Event {} not found", id);
                None
            }
            Err(e) => {
                warn!("Event {} lookup failed: {}", id, e);
                metrics::api::request_error(error_kind(&e));
                None
            }
        }
    }

    /// Every upcoming event, paging until a short or empty page or the
    /// configured page cap.
    #[instrument(skip(self))]
    pub async fn fetch_all(&self) -> Vec<ApiEvent> {
        let page_size = self.config.fetch_all_page_size;
        let mut all = Vec::new();

        for page in 1..=self.config.max_pages {
            let query = EventQuery::everywhere()
                .with_page(page)
                .with_page_size(page_size);
            let fetched = self.fetch_page(&query).await;
            metrics::api::page_fetched();
            all.extend(fetched.events);

            if fetched.raw_len < page_size as usize {
                break;
            }
            if page == self.config.max_pages {
                warn!("Stopped paging at the {} page cap", self.config.max_pages);
            }
        }

        info!("Fetched {} events across all pages", all.len());
        all
    }

    async fn get_json(&self, url: &str) -> Result<HttpGetResult> {
        let headers = [("Accept", "application/json".to_string())];
        let response = self.http.get(url, &headers).await?;
        if !response.is_success() {
            return Err(ScraperError::Status {
                status: response.status,
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

fn decode_records(records: Vec<serde_json::Value>) -> Vec<ApiEvent> {
    records
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<ApiEvent>(raw) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("Skipping malformed event record: {}", e);
                metrics::api::record_skipped();
                None
            }
        })
        .collect()
}

fn error_kind(error: &ScraperError) -> &'static str {
    match error {
        ScraperError::Http(_) => "transport",
        ScraperError::Status { .. } => "status",
        ScraperError::Json(_) => "decode",
        _ => "other",
    }
}
