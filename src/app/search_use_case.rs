use crate::apis::normalizer::transform_api_event_in;
use crate::apis::{EventQuery, Geocoder, RiftboundClient};
use crate::constants::{DEFAULT_RADIUS_MILES, KEY_LAST_SEARCH_LOCATION};
use crate::error::Result;
use crate::filters::SearchFilter;
use crate::pipeline::merge::{CalendarState, CalendarStore};
use crate::pipeline::temporal::starts_today_or_later;
use crate::storage::{self, Scope};
use crate::types::{CanonicalEvent, GeoPoint};
use chrono::{DateTime, Local, TimeZone};
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub location: String,
    pub radius_miles: u32,
    pub filter: SearchFilter,
    /// Location picked from autocomplete; reused when its display name is
    /// still the query text.
    pub selected: Option<GeoPoint>,
}

impl SearchRequest {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            radius_miles: DEFAULT_RADIUS_MILES,
            filter: SearchFilter::All,
            selected: None,
        }
    }

    pub fn with_radius(mut self, radius_miles: u32) -> Self {
        self.radius_miles = radius_miles;
        self
    }

    pub fn with_filter(mut self, filter: SearchFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_selected(mut self, selected: Option<GeoPoint>) -> Self {
        self.selected = selected;
        self
    }
}

#[derive(Debug, Clone)]
pub enum SearchOutcome {
    LocationNotFound,
    NoEvents {
        location: GeoPoint,
        radius_miles: u32,
    },
    Found {
        events: Vec<CanonicalEvent>,
        location: GeoPoint,
        radius_miles: u32,
        calendar: CalendarState,
    },
}

/// Nearby-event search feeding the calendar's searched set.
pub struct SearchUseCase {
    client: RiftboundClient,
    geocoder: Geocoder,
    store: Arc<CalendarStore>,
}

impl SearchUseCase {
    pub fn new(client: RiftboundClient, geocoder: Geocoder, store: Arc<CalendarStore>) -> Self {
        Self {
            client,
            geocoder,
            store,
        }
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome> {
        self.search_at(request, &Local::now()).await
    }

    #[instrument(skip(self, request, now), fields(location = %request.location, radius = request.radius_miles))]
    pub async fn search_at<Tz: TimeZone>(&self, request: &SearchRequest, now: &DateTime<Tz>) -> Result<SearchOutcome>
    where
        Tz::Offset: std::fmt::Display,
    {
        let query = request.location.trim();
        storage::save(self.store.storage(), Scope::Local, KEY_LAST_SEARCH_LOCATION, query).await?;

        let Some(location) = self.resolve_location(query, request.selected.as_ref()).await else {
            warn!("Could not resolve location {:?}", query);
            return Ok(SearchOutcome::LocationNotFound);
        };

        let page = EventQuery::around(location.lat, location.lng, request.radius_miles)
            .with_page_size(self.client.config().search_page_size);
        let raw = self.client.fetch_events(&page).await;
        if raw.is_empty() {
            return Ok(SearchOutcome::NoEvents {
                location,
                radius_miles: request.radius_miles,
            });
        }

        let tz = now.timezone();
        let events: Vec<CanonicalEvent> = raw
            .iter()
            .map(|r| transform_api_event_in(r, &tz))
            .filter(|e| starts_today_or_later(e, now))
            .filter(|e| request.filter.matches(e))
            .collect();
        info!(
            "Search near {} kept {} of {} events",
            location.display_name,
            events.len(),
            raw.len()
        );

        self.store.save_searched(&events).await?;
        let calendar = self.store.load_at(now).await?;
        Ok(SearchOutcome::Found {
            events,
            location,
            radius_miles: request.radius_miles,
            calendar,
        })
    }

    async fn resolve_location(&self, query: &str, selected: Option<&GeoPoint>) -> Option<GeoPoint> {
        if let Some(point) = selected.filter(|p| p.display_name == query) {
            return Some(point.clone());
        }
        self.geocoder.geocode(query).await
    }

    pub async fn last_location(&self) -> Result<Option<String>> {
        storage::load(self.store.storage(), Scope::Local, KEY_LAST_SEARCH_LOCATION).await
    }
}
