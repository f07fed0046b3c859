use crate::apis::RiftboundClient;
use crate::app::ports::ProgressPort;
use crate::constants::{
    KEY_MY_EVENTS, KEY_MY_EVENTS_LAST_SYNC, KEY_MY_EVENT_IDS, KEY_MY_EVENT_IDS_LAST_SYNC,
};
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::enrich::enrich_event_ids;
use crate::pipeline::merge::{CalendarState, CalendarStore};
use crate::pipeline::temporal::is_past_at;
use crate::scrapers::locator::{extractor::extract_events_in, my_events::extract_event_ids};
use crate::storage::{self, Scope};
use crate::types::CanonicalEvent;
use chrono::{DateTime, Local, TimeZone, Utc};
use std::sync::Arc;
use tracing::{info, instrument};

/// What a sync run produced.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Events kept after dropping past ones.
    pub events: Vec<CanonicalEvent>,
    /// IDs the API no longer knows plus events that already happened.
    pub past: usize,
    pub calendar: CalendarState,
}

/// Keeps the registered-event cache in step with the My Events page.
pub struct SyncUseCase {
    client: RiftboundClient,
    store: Arc<CalendarStore>,
}

impl SyncUseCase {
    pub fn new(client: RiftboundClient, store: Arc<CalendarStore>) -> Self {
        Self { client, store }
    }

    /// Collects registered event IDs from a My Events page and remembers
    /// them for the next ID sync.
    pub async fn save_ids_from_page(&self, html: &str) -> Result<Vec<u64>> {
        let ids = extract_event_ids(html);
        self.save_ids(&ids).await?;
        Ok(ids)
    }

    pub async fn save_ids(&self, ids: &[u64]) -> Result<()> {
        let storage = self.store.storage();
        storage::save(storage, Scope::Local, KEY_MY_EVENT_IDS, ids).await?;
        storage::save(storage, Scope::Local, KEY_MY_EVENT_IDS_LAST_SYNC, &Utc::now()).await?;
        info!("Saved {} registered event IDs", ids.len());
        Ok(())
    }

    pub async fn saved_ids(&self) -> Result<Vec<u64>> {
        Ok(storage::load(self.store.storage(), Scope::Local, KEY_MY_EVENT_IDS)
            .await?
            .unwrap_or_default())
    }

    /// Resolves each ID against the API, drops past events and replaces the
    /// registered cache.
    pub async fn sync_ids(&self, ids: &[u64], progress: &dyn ProgressPort) -> Result<SyncReport> {
        self.sync_ids_at(ids, progress, &Local::now()).await
    }

    #[instrument(skip(self, ids, progress, now), fields(count = ids.len()))]
    pub async fn sync_ids_at<Tz: TimeZone>(
        &self,
        ids: &[u64],
        progress: &dyn ProgressPort,
        now: &DateTime<Tz>,
    ) -> Result<SyncReport>
    where
        Tz::Offset: std::fmt::Display,
    {
        let enrichment = enrich_event_ids(&self.client, ids, progress, &now.timezone()).await;
        let resolved = enrichment.events.len();
        let events: Vec<CanonicalEvent> = enrichment
            .events
            .into_iter()
            .filter(|e| !is_past_at(e, now))
            .collect();
        let past = enrichment.not_found.len() + (resolved - events.len());
        self.finish(events, past, now).await
    }

    /// Fallback when the API is unreachable: keep whatever the cards on the
    /// saved page say.
    pub async fn sync_scraped(&self, html: &str) -> Result<SyncReport> {
        self.sync_scraped_at(html, &Local::now()).await
    }

    #[instrument(skip_all, fields(bytes = html.len()))]
    pub async fn sync_scraped_at<Tz: TimeZone>(&self, html: &str, now: &DateTime<Tz>) -> Result<SyncReport>
    where
        Tz::Offset: std::fmt::Display,
    {
        let extracted = extract_events_in(html, &now.timezone());
        let total = extracted.len();
        let events: Vec<CanonicalEvent> = extracted
            .into_iter()
            .filter(|e| !is_past_at(e, now))
            .collect();
        let past = total - events.len();
        self.finish(events, past, now).await
    }

    async fn finish<Tz: TimeZone>(
        &self,
        events: Vec<CanonicalEvent>,
        past: usize,
        now: &DateTime<Tz>,
    ) -> Result<SyncReport> {
        metrics::sync::events_dropped_past(past);
        let storage = self.store.storage();
        storage::save(storage, Scope::Local, KEY_MY_EVENTS, &events).await?;
        storage::save(storage, Scope::Local, KEY_MY_EVENTS_LAST_SYNC, &Utc::now()).await?;
        info!("Synced {} upcoming events ({} past)", events.len(), past);

        let calendar = self.store.load_at(now).await?;
        Ok(SyncReport {
            events,
            past,
            calendar,
        })
    }
}
