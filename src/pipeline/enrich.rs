use crate::apis::normalizer::transform_api_event_in;
use crate::apis::RiftboundClient;
use crate::app::ports::ProgressPort;
use crate::observability::metrics;
use crate::pipeline::matcher::EventMatcher;
use crate::types::{CanonicalEvent, Source, Status};
use chrono::TimeZone;
use tracing::{debug, info, instrument};

/// Result of resolving registered event IDs against the API.
#[derive(Debug, Clone, Default)]
pub struct IdEnrichment {
    pub events: Vec<CanonicalEvent>,
    /// IDs the API no longer resolves; these events have concluded.
    pub not_found: Vec<u64>,
}

/// Looks up each ID one at a time, in order, reporting `(done, total)`
/// after every lookup.
#[instrument(skip(client, progress, tz), fields(total = ids.len()))]
pub async fn enrich_event_ids<Tz: TimeZone>(
    client: &RiftboundClient,
    ids: &[u64],
    progress: &dyn ProgressPort,
    tz: &Tz,
) -> IdEnrichment
where
    Tz::Offset: std::fmt::Display,
{
    let mut result = IdEnrichment::default();
    for (index, id) in ids.iter().enumerate() {
        match client.fetch_event_by_id(*id).await {
            Some(raw) => {
                let mut event = transform_api_event_in(&raw, tz);
                event.is_registered = true;
                event.status = Status::Registered;
                result.events.push(event);
            }
            None => {
                debug!("Event {} did not resolve, treating as past", id);
                result.not_found.push(*id);
            }
        }
        progress.report(index + 1, ids.len());
    }
    info!(
        "Resolved {} of {} registered events",
        result.events.len(),
        ids.len()
    );
    metrics::sync::events_enriched(result.events.len());
    result
}

/// Upgrades scraped events with matching API records from the full
/// upcoming listing. Unmatched events stay scraped.
#[instrument(skip_all, fields(count = scraped.len()))]
pub async fn enrich_events_with_api<Tz: TimeZone>(
    client: &RiftboundClient,
    matcher: &EventMatcher,
    scraped: Vec<CanonicalEvent>,
    tz: &Tz,
) -> Vec<CanonicalEvent>
where
    Tz::Offset: std::fmt::Display,
{
    if scraped.is_empty() {
        return scraped;
    }
    let api_events = client.fetch_all().await;
    if api_events.is_empty() {
        info!("No API events available, keeping scraped data");
        return scraped;
    }
    reconcile(matcher, scraped, &api_events, tz)
}

/// Pure half of [`enrich_events_with_api`].
pub fn reconcile<Tz: TimeZone>(
    matcher: &EventMatcher,
    scraped: Vec<CanonicalEvent>,
    api_events: &[crate::apis::ApiEvent],
    tz: &Tz,
) -> Vec<CanonicalEvent>
where
    Tz::Offset: std::fmt::Display,
{
    let enriched: Vec<CanonicalEvent> = scraped
        .into_iter()
        .map(|event| match matcher.best_match_in(&event, api_events, tz) {
            Some(found) => {
                let mut upgraded = transform_api_event_in(found.event, tz);
                upgraded.status = event.status;
                upgraded.is_registered = event.is_registered;
                upgraded
            }
            None => CanonicalEvent {
                source: Source::Scraped,
                ..event
            },
        })
        .collect();

    let matched = enriched.iter().filter(|e| e.source == Source::Api).count();
    info!("Matched {} of {} events to API records", matched, enriched.len());
    enriched
}
