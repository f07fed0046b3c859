mod common;

use common::{api_record, page, utc, FakeHttp};
use rift_scraper::apis::RiftboundClient;
use rift_scraper::app::{RefreshUseCase, SyncUseCase};
use rift_scraper::config::ApiConfig;
use rift_scraper::constants::{KEY_MY_EVENTS, KEY_MY_EVENTS_LAST_SYNC};
use rift_scraper::pipeline::{CalendarStore, EventMatcher};
use rift_scraper::storage::{self, InMemoryStorage, JsonFileStorage, Scope, Storage};
use rift_scraper::types::{CanonicalEvent, Source, Status};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

fn registered(title: &str, date: &str) -> CanonicalEvent {
    CanonicalEvent {
        title: title.into(),
        date: date.into(),
        time: "7:00 PM".into(),
        status: Status::Registered,
        is_registered: true,
        source: Source::Scraped,
        ..Default::default()
    }
}

fn searched(id: u64, title: &str, date: &str) -> CanonicalEvent {
    CanonicalEvent {
        id: Some(id),
        title: title.into(),
        date: date.into(),
        time: "7:00 PM".into(),
        price: "Free".into(),
        capacity: 16,
        source: Source::Api,
        ..Default::default()
    }
}

#[tokio::test]
async fn id_sync_drops_missing_and_past_events() {
    let http = FakeHttp::new(|url| {
        if url.contains("/events/1/?") {
            (200, api_record(1, "Nexus Night", "2026-02-01T18:00:00Z").to_string())
        } else if url.contains("/events/2/?") {
            (200, api_record(2, "Summoner Skirmish", "2025-12-01T18:00:00Z").to_string())
        } else {
            (404, String::new())
        }
    });
    let backend = Arc::new(InMemoryStorage::new());
    let store = Arc::new(CalendarStore::new(backend.clone()));
    let sync = SyncUseCase::new(RiftboundClient::new(http.clone(), ApiConfig::default()), store.clone());

    let seen = Mutex::new(Vec::new());
    let progress = |done: usize, total: usize| seen.lock().unwrap().push((done, total));
    let report = sync
        .sync_ids_at(&[1, 2, 3], &progress, &utc(2026, 1, 5, 12))
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    assert_eq!(report.past, 2);
    assert_eq!(report.events.len(), 1);
    let kept = &report.events[0];
    assert_eq!(kept.id, Some(1));
    assert_eq!(kept.status, Status::Registered);
    assert!(kept.is_registered);
    assert_eq!(kept.source, Source::Api);

    assert_eq!(store.my_events().await.unwrap().len(), 1);
    let stamp = backend.get(Scope::Local, &[KEY_MY_EVENTS_LAST_SYNC]).await.unwrap();
    assert!(stamp.contains_key(KEY_MY_EVENTS_LAST_SYNC));
    assert_eq!(http.call_count(), 3);
}

#[tokio::test]
async fn saved_ids_round_trip_through_storage() {
    let store = Arc::new(CalendarStore::new(Arc::new(InMemoryStorage::new())));
    let sync = SyncUseCase::new(RiftboundClient::new(FakeHttp::offline(), ApiConfig::default()), store);

    let ids = sync
        .save_ids_from_page(r#"<a href="/events/9">a</a><a href="/events/4?x=1">b</a><a href="/events/9">c</a>"#)
        .await
        .unwrap();

    assert_eq!(ids, vec![9, 4]);
    assert_eq!(sync.saved_ids().await.unwrap(), vec![9, 4]);
}

#[tokio::test]
async fn registered_event_is_upgraded_once() {
    let backend = Arc::new(InMemoryStorage::new());
    let store = CalendarStore::new(backend.clone());
    storage::save(
        backend.as_ref(),
        Scope::Local,
        KEY_MY_EVENTS,
        &vec![registered("Nexus Night", "Jan 10, 2026")],
    )
    .await
    .unwrap();
    store
        .save_searched(&[
            searched(55, "Nexus Night", "Jan 10, 2026"),
            searched(56, "Summoner Skirmish", "Jan 12, 2026"),
        ])
        .await
        .unwrap();

    let now = utc(2026, 1, 5, 12);
    let first = store.load_at(&now).await.unwrap();

    assert_eq!(first.events.len(), 2);
    let upgraded = &first.events[0];
    assert_eq!(upgraded.id, Some(55));
    assert_eq!(upgraded.status, Status::Registered);
    assert!(upgraded.is_registered);
    assert!(!first.events[1].is_registered);

    let stored = store.my_events().await.unwrap();
    assert_eq!(stored[0].id, Some(55));
    assert_eq!(stored[0].status, Status::Registered);

    let second = store.load_at(&now).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(store.my_events().await.unwrap(), stored);
}

#[tokio::test]
async fn refresh_upgrades_matching_events() {
    let http = FakeHttp::new(|_| {
        (
            200,
            page(vec![
                api_record(700, "Nexus Night", "2026-01-10T12:00:00Z"),
                api_record(701, "Riftbound Open", "2026-01-20T12:00:00Z"),
            ]),
        )
    });
    let backend = Arc::new(InMemoryStorage::new());
    let store = Arc::new(CalendarStore::new(backend.clone()));
    storage::save(
        backend.as_ref(),
        Scope::Local,
        KEY_MY_EVENTS,
        &vec![
            registered("Nexus Night", "Jan 10, 2026"),
            registered("Casual Cube Draft", "Jan 10, 2026"),
        ],
    )
    .await
    .unwrap();
    let refresh = RefreshUseCase::new(
        RiftboundClient::new(http.clone(), ApiConfig::default()),
        EventMatcher::default(),
        store.clone(),
    );

    let report = refresh.refresh().await.unwrap().unwrap();

    assert_eq!(report.from_api, 1);
    assert_eq!(report.events[0].id, Some(700));
    assert_eq!(report.events[0].status, Status::Registered);
    assert!(report.events[0].is_registered);
    assert_eq!(report.events[1].source, Source::Scraped);
    assert_eq!(store.my_events().await.unwrap(), report.events);
    // one short page ends paging
    assert_eq!(http.call_count(), 1);
}

#[tokio::test]
async fn refresh_with_nothing_stored_does_nothing() {
    let store = Arc::new(CalendarStore::new(Arc::new(InMemoryStorage::new())));
    let refresh = RefreshUseCase::new(
        RiftboundClient::new(FakeHttp::offline(), ApiConfig::default()),
        EventMatcher::default(),
        store,
    );
    assert!(refresh.refresh().await.unwrap().is_none());
}

#[tokio::test]
async fn file_store_survives_reopen() {
    let dir = tempdir().unwrap();
    let events = vec![searched(1, "Nexus Night", "Jan 10, 2026")];
    {
        let store = CalendarStore::new(Arc::new(JsonFileStorage::new(dir.path())));
        store.save_searched(&events).await.unwrap();
    }

    let reopened = CalendarStore::new(Arc::new(JsonFileStorage::new(dir.path())));
    assert_eq!(reopened.searched_events().await.unwrap(), events);
    assert!(dir.path().join("local.json").exists());

    reopened.clear_searched().await.unwrap();
    assert!(reopened.searched_events().await.unwrap().is_empty());
}
