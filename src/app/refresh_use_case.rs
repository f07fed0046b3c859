use crate::apis::RiftboundClient;
use crate::constants::{KEY_MY_EVENTS, KEY_MY_EVENTS_LAST_SYNC};
use crate::error::Result;
use crate::pipeline::enrich::enrich_events_with_api;
use crate::pipeline::matcher::EventMatcher;
use crate::pipeline::merge::CalendarStore;
use crate::storage::{self, Scope};
use crate::types::{CanonicalEvent, Source};
use chrono::Local;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct RefreshReport {
    pub events: Vec<CanonicalEvent>,
    pub from_api: usize,
}

/// Re-enriches the stored registered events against the full upcoming
/// listing.
pub struct RefreshUseCase {
    client: RiftboundClient,
    matcher: EventMatcher,
    store: Arc<CalendarStore>,
}

impl RefreshUseCase {
    pub fn new(client: RiftboundClient, matcher: EventMatcher, store: Arc<CalendarStore>) -> Self {
        Self {
            client,
            matcher,
            store,
        }
    }

    /// `None` when there is nothing stored to refresh.
    pub async fn refresh(&self) -> Result<Option<RefreshReport>> {
        let stored = self.store.my_events().await?;
        if stored.is_empty() {
            info!("No registered events to refresh");
            return Ok(None);
        }

        let events = enrich_events_with_api(&self.client, &self.matcher, stored, &Local).await;
        let from_api = events.iter().filter(|e| e.source == Source::Api).count();

        let storage = self.store.storage();
        storage::save(storage, Scope::Local, KEY_MY_EVENTS, &events).await?;
        storage::save(storage, Scope::Local, KEY_MY_EVENTS_LAST_SYNC, &chrono::Utc::now()).await?;
        info!("Updated {}/{} events with full details", from_api, events.len());

        Ok(Some(RefreshReport { events, from_api }))
    }
}
