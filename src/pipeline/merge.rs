//! Calendar merge of registered and searched events.
//!
//! Events are keyed by `title-date` exactly. A registered event whose key
//! matches an API-sourced searched event is upgraded to the API record while
//! staying registered; other searched events are added unregistered unless
//! the key is already taken.

use crate::constants::{KEY_MY_EVENTS, KEY_SEARCHED_EVENTS};
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::temporal::{is_past_at, parse_display_date, sort_by_start};
use crate::storage::{self, Scope, Storage};
use crate::types::{CanonicalEvent, Source, Status};
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// A registered entry that was replaced by richer API data during a merge.
#[derive(Debug, Clone, PartialEq)]
pub struct Upgrade {
    pub title: String,
    pub date: String,
    pub event: CanonicalEvent,
}

/// Inserts under `key`, overwriting in place when the key is already taken.
fn place(events: &mut Vec<CanonicalEvent>, slots: &mut HashMap<String, usize>, key: String, event: CanonicalEvent) {
    match slots.get(&key) {
        Some(&slot) => events[slot] = event,
        None => {
            slots.insert(key, events.len());
            events.push(event);
        }
    }
}

/// Explicit calendar state: the two source sets and their merged union.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalendarState {
    pub registered_events: Vec<CanonicalEvent>,
    pub searched_events: Vec<CanonicalEvent>,
    pub events: Vec<CanonicalEvent>,
}

impl CalendarState {
    pub fn new(registered_events: Vec<CanonicalEvent>, searched_events: Vec<CanonicalEvent>) -> Self {
        let mut state = Self {
            registered_events,
            searched_events,
            events: Vec::new(),
        };
        state.merge();
        state
    }

    /// Rebuilds `events`, replacing upgraded registered entries in place.
    /// Returns only upgrades that changed a registered entry, so re-running
    /// with unchanged inputs reports none.
    pub fn merge(&mut self) -> Vec<Upgrade> {
        let searched_by_key: HashMap<String, &CanonicalEvent> = self
            .searched_events
            .iter()
            .map(|e| (e.merge_key(), e))
            .collect();

        let mut events: Vec<CanonicalEvent> = Vec::new();
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut registered = Vec::with_capacity(self.registered_events.len());
        let mut upgrades = Vec::new();

        for event in &self.registered_events {
            let key = event.merge_key();
            let merged = match searched_by_key.get(&key) {
                Some(api) if api.source == Source::Api => {
                    let upgraded = CanonicalEvent {
                        is_registered: true,
                        status: Status::Registered,
                        ..(*api).clone()
                    };
                    if *event != upgraded {
                        upgrades.push(Upgrade {
                            title: event.title.clone(),
                            date: event.date.clone(),
                            event: upgraded.clone(),
                        });
                    }
                    upgraded
                }
                _ => CanonicalEvent {
                    is_registered: true,
                    ..event.clone()
                },
            };
            place(&mut events, &mut slots, key, merged.clone());
            registered.push(merged);
        }

        for event in &self.searched_events {
            let key = event.merge_key();
            if !slots.contains_key(&key) {
                place(
                    &mut events,
                    &mut slots,
                    key,
                    CanonicalEvent {
                        is_registered: false,
                        ..event.clone()
                    },
                );
            }
        }

        if !upgrades.is_empty() {
            debug!("Upgraded {} registered events with API data", upgrades.len());
        }
        self.registered_events = registered;
        self.events = events;
        upgrades
    }

    /// Replaces the searched set and re-merges.
    pub fn set_searched(&mut self, events: Vec<CanonicalEvent>) -> Vec<Upgrade> {
        self.searched_events = events;
        self.merge()
    }

    pub fn set_registered(&mut self, events: Vec<CanonicalEvent>) -> Vec<Upgrade> {
        self.registered_events = events;
        self.merge()
    }

    pub fn clear_searched(&mut self) {
        self.searched_events.clear();
        self.merge();
    }

    /// Drops past events from both source sets and re-merges.
    pub fn drop_past<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> Vec<Upgrade> {
        self.registered_events.retain(|e| !is_past_at(e, now));
        self.searched_events.retain(|e| !is_past_at(e, now));
        self.merge()
    }

    /// Merged events whose display date falls on `day`.
    pub fn events_for_day(&self, day: NaiveDate) -> Vec<&CanonicalEvent> {
        self.events
            .iter()
            .filter(|e| parse_display_date(&e.date) == Some(day))
            .collect()
    }

    pub fn registered_sorted<Tz: TimeZone>(&self, tz: &Tz) -> Vec<CanonicalEvent> {
        let mut events = self.registered_events.clone();
        sort_by_start(&mut events, tz);
        events
    }

    pub fn registered_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_registered).count()
    }
}

/// Loads and persists calendar state through the key-value store.
pub struct CalendarStore {
    storage: Arc<dyn Storage>,
}

impl CalendarStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub async fn my_events(&self) -> Result<Vec<CanonicalEvent>> {
        Ok(storage::load(self.storage(), Scope::Local, KEY_MY_EVENTS)
            .await?
            .unwrap_or_default())
    }

    pub async fn searched_events(&self) -> Result<Vec<CanonicalEvent>> {
        Ok(storage::load(self.storage(), Scope::Local, KEY_SEARCHED_EVENTS)
            .await?
            .unwrap_or_default())
    }

    /// Reads both sets, drops past events, merges and persists any upgrades.
    pub async fn load(&self) -> Result<CalendarState> {
        self.load_at(&Local::now()).await
    }

    pub async fn load_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<CalendarState> {
        let registered: Vec<CanonicalEvent> = self
            .my_events()
            .await?
            .into_iter()
            .filter(|e| !is_past_at(e, now))
            .collect();
        let searched: Vec<CanonicalEvent> = self
            .searched_events()
            .await?
            .into_iter()
            .filter(|e| !is_past_at(e, now))
            .collect();

        let mut state = CalendarState {
            registered_events: registered,
            searched_events: searched,
            events: Vec::new(),
        };
        let upgrades = state.merge();
        self.persist_upgrades(&upgrades).await?;
        Ok(state)
    }

    /// Writes upgraded entries back into the stored registered set, matching
    /// on title and date.
    pub async fn persist_upgrades(&self, upgrades: &[Upgrade]) -> Result<()> {
        if upgrades.is_empty() {
            return Ok(());
        }
        let stored = self.my_events().await?;
        let updated: Vec<CanonicalEvent> = stored
            .into_iter()
            .map(|event| {
                upgrades
                    .iter()
                    .find(|u| u.title == event.title && u.date == event.date)
                    .map(|u| u.event.clone())
                    .unwrap_or(event)
            })
            .collect();
        for _ in upgrades {
            metrics::merge::registered_upgraded();
        }
        storage::save(self.storage(), Scope::Local, KEY_MY_EVENTS, &updated).await?;
        info!("Persisted {} upgraded registered events", upgrades.len());
        Ok(())
    }

    pub async fn save_searched(&self, events: &[CanonicalEvent]) -> Result<()> {
        storage::save(self.storage(), Scope::Local, KEY_SEARCHED_EVENTS, events).await
    }

    pub async fn clear_searched(&self) -> Result<()> {
        self.storage.remove(Scope::Local, &[KEY_SEARCHED_EVENTS]).await
    }

    pub async fn clear_cache(&self) -> Result<()> {
        self.storage.clear(Scope::Local).await
    }
}
