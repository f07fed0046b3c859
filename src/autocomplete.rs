//! Debounced location suggestions.
//!
//! Each keystroke cancels the pending timer and starts a new one. Once a
//! timer fires its lookup runs to completion, but a response is only kept
//! if no newer keystroke arrived in the meantime.

use crate::apis::Geocoder;
use crate::types::{GeoPoint, LocationSuggestion};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn suggestions(&self, query: &str) -> Vec<LocationSuggestion>;
}

#[async_trait]
impl SuggestionSource for Geocoder {
    async fn suggestions(&self, query: &str) -> Vec<LocationSuggestion> {
        Geocoder::suggestions(self, query).await
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutocompleteState {
    pub query: String,
    pub suggestions: Vec<LocationSuggestion>,
    pub selected_index: Option<usize>,
    /// Set when the user picks a suggestion; cleared on the next keystroke.
    pub selected_location: Option<GeoPoint>,
}

pub struct Autocomplete {
    source: Arc<dyn SuggestionSource>,
    quiet_period: Duration,
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
    state: Arc<Mutex<AutocompleteState>>,
    updates: watch::Sender<u64>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Autocomplete {
    pub fn new(source: Arc<dyn SuggestionSource>, quiet_period: Duration) -> Self {
        let (updates, _) = watch::channel(0);
        Self {
            source,
            quiet_period,
            generation: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
            state: Arc::new(Mutex::new(AutocompleteState::default())),
            updates,
        }
    }

    /// Receives the generation number each time suggestions are replaced.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.updates.subscribe()
    }

    pub fn state(&self) -> AutocompleteState {
        lock(&self.state).clone()
    }

    /// Handles a keystroke. Must be called from within a tokio runtime.
    pub fn on_input(&self, query: &str) {
        if let Some(timer) = lock(&self.pending).take() {
            timer.abort();
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = lock(&self.state);
            state.query = query.to_string();
            state.selected_location = None;
        }

        let query = query.to_string();
        let source = Arc::clone(&self.source);
        let current = Arc::clone(&self.generation);
        let state = Arc::clone(&self.state);
        let updates = self.updates.clone();
        let quiet_period = self.quiet_period;

        let timer = tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            // Past this point the lookup is not cancelled, only discarded
            // if stale.
            tokio::spawn(async move {
                let suggestions = if query.trim().chars().count() < 2 {
                    Vec::new()
                } else {
                    source.suggestions(&query).await
                };
                if current.load(Ordering::SeqCst) != generation {
                    debug!("Discarding stale suggestions for {:?}", query);
                    return;
                }
                {
                    let mut state = lock(&state);
                    state.suggestions = suggestions;
                    state.selected_index = None;
                }
                updates.send_replace(generation);
            });
        });
        *lock(&self.pending) = Some(timer);
    }

    pub fn move_down(&self) {
        let mut state = lock(&self.state);
        if state.suggestions.is_empty() {
            return;
        }
        let last = state.suggestions.len() - 1;
        state.selected_index = Some(state.selected_index.map_or(0, |i| (i + 1).min(last)));
    }

    pub fn move_up(&self) {
        let mut state = lock(&self.state);
        if state.suggestions.is_empty() {
            return;
        }
        state.selected_index = Some(state.selected_index.map_or(0, |i| i.saturating_sub(1)));
    }

    /// Picks a suggestion, remembering its coordinates for the next search.
    pub fn select(&self, index: usize) -> Option<GeoPoint> {
        let mut state = lock(&self.state);
        let suggestion = state.suggestions.get(index)?.clone();
        let point = GeoPoint::from(suggestion);
        state.query = point.display_name.clone();
        state.selected_location = Some(point.clone());
        state.selected_index = None;
        Some(point)
    }

    pub fn selected_location(&self) -> Option<GeoPoint> {
        lock(&self.state).selected_location.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct SlowSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SuggestionSource for SlowSource {
        async fn suggestions(&self, query: &str) -> Vec<LocationSuggestion> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = if query.starts_with("slow") { 1000 } else { 10 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            vec![LocationSuggestion {
                lat: 1.0,
                lng: 2.0,
                display_name: query.to_string(),
                kind: "city".into(),
            }]
        }
    }

    fn setup() -> (Autocomplete, Arc<SlowSource>) {
        let source = Arc::new(SlowSource {
            calls: AtomicUsize::new(0),
        });
        (Autocomplete::new(source.clone(), Duration::from_millis(300)), source)
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_typing_issues_one_lookup() {
        let (autocomplete, source) = setup();
        autocomplete.on_input("at");
        tokio::time::sleep(Duration::from_millis(100)).await;
        autocomplete.on_input("atl");
        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(autocomplete.state().suggestions[0].display_name, "atl");
    }

    #[tokio::test(start_paused = true)]
    async fn late_response_from_older_query_is_discarded() {
        let (autocomplete, source) = setup();
        autocomplete.on_input("slow query");
        tokio::time::sleep(Duration::from_millis(400)).await;
        autocomplete.on_input("boston");
        tokio::time::sleep(Duration::from_millis(2000)).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        let state = autocomplete.state();
        assert_eq!(state.suggestions.len(), 1);
        assert_eq!(state.suggestions[0].display_name, "boston");
    }

    #[tokio::test(start_paused = true)]
    async fn selection_is_cleared_by_typing() {
        let (autocomplete, _) = setup();
        autocomplete.on_input("denver");
        tokio::time::sleep(Duration::from_millis(500)).await;

        autocomplete.move_down();
        let picked = autocomplete.select(0).unwrap();
        assert_eq!(autocomplete.selected_location(), Some(picked));

        autocomplete.on_input("denv");
        assert!(autocomplete.selected_location().is_none());
    }
}
