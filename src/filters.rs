//! Listing-page visibility filters and the search result type chips.

use crate::constants::KEY_FILTER_STATE;
use crate::error::{Result, ScraperError};
use crate::pipeline::classify::classify_scraped_title;
use crate::storage::{self, Scope, Storage};
use crate::types::{CanonicalEvent, EventType};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

static PRE_RELEASE_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)pre[\s-]?release").expect("pre-release title pattern"));
static CURRENCY_SYMBOL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\$€£¥₹]").expect("currency symbol pattern"));

/// Price flags read from a card's raw text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceFlags {
    pub is_free: bool,
    pub is_paid: bool,
}

impl PriceFlags {
    pub fn detect(card_text: &str) -> Self {
        let is_free = card_text.to_lowercase().contains("free event");
        Self {
            is_free,
            is_paid: !is_free && CURRENCY_SYMBOL_RE.is_match(card_text),
        }
    }
}

/// Persisted on-page filter preferences. Free-only and paid-only are
/// mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    pub event_types: BTreeMap<EventType, bool>,
    pub show_free_only: bool,
    pub show_paid_only: bool,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            event_types: EventType::ALL
                .iter()
                .filter(|t| **t != EventType::Other)
                .map(|t| (*t, true))
                .collect(),
            show_free_only: false,
            show_paid_only: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub visible: usize,
    pub hidden: usize,
}

impl FilterState {
    pub fn set_type(&mut self, event_type: EventType, enabled: bool) {
        self.event_types.insert(event_type, enabled);
    }

    pub fn set_free_only(&mut self, enabled: bool) {
        self.show_free_only = enabled;
        if enabled {
            self.show_paid_only = false;
        }
    }

    pub fn set_paid_only(&mut self, enabled: bool) {
        self.show_paid_only = enabled;
        if enabled {
            self.show_free_only = false;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Unclassified cards are never hidden by the type toggles.
    pub fn should_show(&self, event_type: EventType, price: PriceFlags) -> bool {
        if event_type != EventType::Other && !self.event_types.get(&event_type).copied().unwrap_or(true) {
            return false;
        }
        if self.show_free_only && !price.is_free {
            return false;
        }
        if self.show_paid_only && !price.is_paid {
            return false;
        }
        true
    }

    /// Visibility for a card given its heading and full text.
    pub fn should_show_card(&self, title: &str, card_text: &str) -> bool {
        self.should_show(classify_scraped_title(title), PriceFlags::detect(card_text))
    }

    pub fn stats<'a>(&self, cards: impl IntoIterator<Item = (&'a str, &'a str)>) -> FilterStats {
        cards.into_iter().fold(FilterStats::default(), |mut stats, (title, text)| {
            if self.should_show_card(title, text) {
                stats.visible += 1;
            } else {
                stats.hidden += 1;
            }
            stats
        })
    }

    /// Stored state overlays the defaults, so new types start enabled.
    pub async fn load(storage: &dyn Storage) -> Result<Self> {
        let stored: Option<FilterState> = storage::load(storage, Scope::Sync, KEY_FILTER_STATE).await?;
        let mut state = Self::default();
        if let Some(stored) = stored {
            state.event_types.extend(stored.event_types);
            state.show_free_only = stored.show_free_only;
            state.show_paid_only = stored.show_paid_only && !stored.show_free_only;
        }
        Ok(state)
    }

    pub async fn save(&self, storage: &dyn Storage) -> Result<()> {
        storage::save(storage, Scope::Sync, KEY_FILTER_STATE, self).await
    }
}

/// Type chip applied to search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchFilter {
    #[default]
    All,
    Nexus,
    Skirmish,
    PreRelease,
    /// Opens and open play, never pre-release events.
    Open,
    Free,
}

fn is_pre_release(event: &CanonicalEvent) -> bool {
    event.event_type == EventType::PreRelease || PRE_RELEASE_TITLE_RE.is_match(&event.title)
}

impl SearchFilter {
    pub fn matches(&self, event: &CanonicalEvent) -> bool {
        let label = event.event_type.name().to_lowercase();
        let title = event.title.to_lowercase();
        let mentions = |needle: &str| label.contains(needle) || title.contains(needle);
        match self {
            SearchFilter::All => true,
            SearchFilter::Nexus => mentions("nexus"),
            SearchFilter::Skirmish => mentions("skirmish"),
            SearchFilter::PreRelease => is_pre_release(event),
            SearchFilter::Open => mentions("open") && !is_pre_release(event),
            SearchFilter::Free => event.is_free(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SearchFilter::All => "",
            SearchFilter::Nexus => "Nexus Night ",
            SearchFilter::Skirmish => "Summoner Skirmish ",
            SearchFilter::PreRelease => "Pre/Release ",
            SearchFilter::Open => "Open Play ",
            SearchFilter::Free => "Free ",
        }
    }
}

impl FromStr for SearchFilter {
    type Err = ScraperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" | "" => Ok(SearchFilter::All),
            "nexus" => Ok(SearchFilter::Nexus),
            "skirmish" => Ok(SearchFilter::Skirmish),
            "prerelease" | "pre-release" => Ok(SearchFilter::PreRelease),
            "open" => Ok(SearchFilter::Open),
            "free" => Ok(SearchFilter::Free),
            other => Err(ScraperError::Config(format!("unknown search filter '{}'", other))),
        }
    }
}
