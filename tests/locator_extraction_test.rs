mod common;

use chrono::Utc;
use common::{fixture, utc, FakeHttp};
use rift_scraper::apis::RiftboundClient;
use rift_scraper::app::SyncUseCase;
use rift_scraper::config::ApiConfig;
use rift_scraper::pipeline::CalendarStore;
use rift_scraper::scrapers::locator::extract_event_ids;
use rift_scraper::scrapers::locator::extractor::extract_events_in;
use rift_scraper::storage::InMemoryStorage;
use rift_scraper::types::{EventType, Source, Status};
use std::sync::Arc;

#[test]
fn my_events_page_yields_active_cards() {
    let events = extract_events_in(&fixture("my_events.html"), &Utc);
    assert_eq!(events.len(), 2);

    let nexus = &events[0];
    assert_eq!(nexus.title, "Nexus Night");
    assert_eq!(nexus.event_type, EventType::NexusNight);
    assert_eq!(nexus.date, "Jan 10, 2026");
    assert_eq!(nexus.time, "7:00 PM (EST)");
    assert_eq!(nexus.price, "Free");
    assert_eq!(nexus.format, "Constructed");
    assert_eq!(nexus.players, "12 Players");
    assert_eq!(nexus.store, "Kapow Comics LLC");
    assert_eq!(nexus.status, Status::Registered);
    assert_eq!(nexus.source, Source::Scraped);

    let skirmish = &events[1];
    assert_eq!(skirmish.event_type, EventType::SummonerSkirmish);
    assert_eq!(skirmish.price, "$5.00");
    assert_eq!(skirmish.time, "6:30 PM");
}

#[test]
fn event_ids_follow_document_order() {
    assert_eq!(extract_event_ids(&fixture("my_events.html")), vec![101, 102, 103]);
}

#[test]
fn page_without_cards_is_empty() {
    let events = extract_events_in("<html><body><p>Sign in to see your events</p></body></html>", &Utc);
    assert!(events.is_empty());
}

#[tokio::test]
async fn scraped_sync_keeps_only_upcoming_events() {
    let http = FakeHttp::offline();
    let store = Arc::new(CalendarStore::new(Arc::new(InMemoryStorage::new())));
    let sync = SyncUseCase::new(RiftboundClient::new(http.clone(), ApiConfig::default()), store.clone());

    let report = sync
        .sync_scraped_at(&fixture("my_events.html"), &utc(2026, 1, 5, 12))
        .await
        .unwrap();

    assert_eq!(report.events.len(), 1);
    assert_eq!(report.past, 1);
    assert_eq!(report.events[0].title, "Nexus Night");
    assert_eq!(report.calendar.events.len(), 1);
    assert!(report.calendar.events[0].is_registered);

    let stored = store.my_events().await.unwrap();
    assert_eq!(stored, report.events);
    assert_eq!(http.call_count(), 0);
}
