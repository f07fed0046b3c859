//! Identity matching between scraped event drafts and API records.
//!
//! Two records of the same real event can differ in casing, store prefixes,
//! week/number suffixes and weekday phrases, and the scraped date may be
//! ambiguous about its zone. Each candidate gets a title score from an
//! ordered cascade (first applicable rule wins), a date score, and a
//! weighted total; the best total at or above the acceptance threshold is
//! the match.

use crate::apis::models::ApiEvent;
use crate::observability::metrics;
use crate::pipeline::temporal::{parse_display_date, parse_iso_instant};
use crate::types::CanonicalEvent;
use chrono::{Datelike, Local, NaiveDate, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

/// Scores, weights and thresholds used by the matcher. Loaded from the
/// `[matching]` config section; defaults are the tuned values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub exact_score: f64,
    pub normalized_score: f64,
    pub contains_score: f64,
    pub type_and_store_score: f64,
    pub type_only_score: f64,
    /// Word-overlap similarity must exceed this to score at all.
    pub similarity_floor: f64,
    pub similarity_scale: f64,
    /// Candidates whose title score is below this are dropped before date scoring.
    pub min_title_score: f64,
    pub same_day_score: f64,
    pub same_month_day_score: f64,
    pub date_mismatch_score: f64,
    pub unknown_date_score: f64,
    pub title_weight: f64,
    pub date_weight: f64,
    /// Weights used when the event-type token, not the title text, carried
    /// the title score.
    pub type_led_title_weight: f64,
    pub type_led_date_weight: f64,
    pub store_bonus: f64,
    pub accept_threshold: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            exact_score: 1.0,
            normalized_score: 0.95,
            contains_score: 0.85,
            type_and_store_score: 0.9,
            type_only_score: 0.6,
            similarity_floor: 0.6,
            similarity_scale: 0.7,
            min_title_score: 0.5,
            same_day_score: 1.0,
            same_month_day_score: 0.8,
            date_mismatch_score: 0.1,
            unknown_date_score: 0.5,
            title_weight: 0.6,
            date_weight: 0.4,
            type_led_title_weight: 0.4,
            type_led_date_weight: 0.6,
            store_bonus: 0.1,
            accept_threshold: 0.55,
        }
    }
}

/// Ordered title rewrites. Each strips at most one occurrence.
static TITLE_STRIP_RULES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("store_prefix", r"^[^:]+:\s*"),
        ("riftbound_prefix", r"^(riftbound\s+)?"),
        ("week_suffix", r"\s*-\s*week\s*\d+"),
        ("number_suffix", r"\s*#\d+"),
        (
            "weekday_prefix",
            r"^(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\s+(morning|afternoon|evening|night)?\s*",
        ),
        (
            "month_suffix",
            r"\s*-?\s*(january|february|march|april|may|june|july|august|september|october|november|december)$",
        ),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("static title pattern")))
    .collect()
});

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));
static PUNCTUATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9A-Za-z_\s]").expect("punctuation pattern"));
static STORE_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^:]+):").expect("store prefix pattern"));

/// Coarse event-type tokens, checked in order.
const EVENT_TYPE_TOKENS: [&str; 4] = ["summoner skirmish", "nexus night", "riftbound open", "open play"];

pub fn normalize_title(title: &str) -> String {
    let mut text = title.trim().to_lowercase();
    for (_, rule) in TITLE_STRIP_RULES.iter() {
        text = rule.replace(&text, "").into_owned();
    }
    let text = WHITESPACE_RE.replace_all(&text, " ");
    PUNCTUATION_RE.replace_all(&text, "").trim().to_string()
}

/// Similarity in `[0, 1]`: exact, containment length ratio, or word overlap
/// over words longer than two characters.
pub fn calculate_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a == b {
        return 1.0;
    }
    if a.contains(&b) || b.contains(&a) {
        let (la, lb) = (a.chars().count(), b.chars().count());
        return la.min(lb) as f64 / la.max(lb) as f64;
    }

    let words_a: Vec<&str> = a.split_whitespace().filter(|w| w.chars().count() > 2).collect();
    let words_b: Vec<&str> = b.split_whitespace().filter(|w| w.chars().count() > 2).collect();
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }
    let common = words_a
        .iter()
        .filter(|w| words_b.iter().any(|w2| w2.contains(*w) || w.contains(w2)))
        .count();
    common as f64 / words_a.len().max(words_b.len()) as f64
}

pub fn extract_event_type(title: &str) -> Option<&'static str> {
    let lower = title.to_lowercase();
    EVENT_TYPE_TOKENS.iter().copied().find(|token| lower.contains(token))
}

/// Store name written before a colon in a title, lower-cased.
pub fn extract_store_name(title: &str) -> Option<String> {
    STORE_PREFIX_RE
        .captures(title)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_lowercase())
        .filter(|s| !s.is_empty())
}

fn stores_overlap(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

/// How one candidate scored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateScore {
    pub title: f64,
    pub date: f64,
    pub total: f64,
    pub type_match: bool,
    pub store_match: bool,
}

/// The winning candidate and its score.
#[derive(Debug, Clone, Copy)]
pub struct MatchResult<'a> {
    pub event: &'a ApiEvent,
    pub score: CandidateScore,
}

/// Scraped-side features, computed once per lookup.
struct ScrapedFeatures {
    raw_title: String,
    normalized_title: String,
    event_type: Option<&'static str>,
    title_store: String,
    field_store: String,
    date: Option<NaiveDate>,
}

impl ScrapedFeatures {
    fn new(event: &CanonicalEvent) -> Self {
        Self {
            raw_title: event.title.trim().to_lowercase(),
            normalized_title: normalize_title(&event.title),
            event_type: extract_event_type(&event.title),
            title_store: extract_store_name(&event.title).unwrap_or_default(),
            field_store: event.store.trim().to_lowercase(),
            date: parse_display_date(&event.date),
        }
    }

    fn has_store(&self) -> bool {
        !self.title_store.is_empty() || !self.field_store.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventMatcher {
    config: MatchConfig,
}

impl EventMatcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Best API record for `scraped`, comparing dates in the viewer's zone.
    pub fn find_match<'a>(&self, scraped: &CanonicalEvent, candidates: &'a [ApiEvent]) -> Option<&'a ApiEvent> {
        self.best_match_in(scraped, candidates, &Local).map(|m| m.event)
    }

    pub fn best_match_in<'a, Tz: TimeZone>(
        &self,
        scraped: &CanonicalEvent,
        candidates: &'a [ApiEvent],
        tz: &Tz,
    ) -> Option<MatchResult<'a>> {
        if scraped.title.trim().is_empty() || candidates.is_empty() {
            return None;
        }
        let features = ScrapedFeatures::new(scraped);

        let mut best: Option<MatchResult<'a>> = None;
        for candidate in candidates {
            let Some(score) = self.score(&features, candidate, tz) else {
                continue;
            };
            let best_total = best.map(|b| b.score.total).unwrap_or(0.0);
            if score.total > best_total && score.total >= self.config.accept_threshold {
                best = Some(MatchResult {
                    event: candidate,
                    score,
                });
            }
        }

        match &best {
            Some(found) => {
                debug!(
                    "Matched {:?} to API event {} (score {:.2})",
                    scraped.title, found.event.id, found.score.total
                );
                metrics::matching::matched();
            }
            None => {
                debug!("No API match for {:?}", scraped.title);
                metrics::matching::unmatched();
            }
        }
        best
    }

    /// Scores one candidate. `None` when it is vetoed or its title score is
    /// too low to continue.
    pub fn score_candidate<Tz: TimeZone>(
        &self,
        scraped: &CanonicalEvent,
        candidate: &ApiEvent,
        tz: &Tz,
    ) -> Option<CandidateScore> {
        self.score(&ScrapedFeatures::new(scraped), candidate, tz)
    }

    fn score<Tz: TimeZone>(&self, scraped: &ScrapedFeatures, candidate: &ApiEvent, tz: &Tz) -> Option<CandidateScore> {
        let cfg = &self.config;
        let api_title = candidate.name().trim().to_lowercase();
        let api_normalized = normalize_title(candidate.name());
        let api_store = candidate.store_name().trim().to_lowercase();

        let type_match = matches!(
            (scraped.event_type, extract_event_type(candidate.name())),
            (Some(a), Some(b)) if a == b
        );
        let store_match = stores_overlap(&scraped.title_store, &api_store)
            || stores_overlap(&scraped.field_store, &api_store);

        // Same event type at two different stores is a different event,
        // however alike the titles read. Identical titles are not exempt:
        // every store runs a plain "Summoner Skirmish".
        if type_match && scraped.has_store() && !api_store.is_empty() && !store_match {
            return None;
        }

        let title = if api_title == scraped.raw_title {
            cfg.exact_score
        } else if !api_normalized.is_empty() && api_normalized == scraped.normalized_title {
            cfg.normalized_score
        } else if !api_title.is_empty()
            && (api_title.contains(&scraped.raw_title) || scraped.raw_title.contains(&api_title))
        {
            cfg.contains_score
        } else if type_match && store_match {
            cfg.type_and_store_score
        } else if type_match {
            cfg.type_only_score
        } else {
            let similarity = calculate_similarity(&scraped.raw_title, &api_title);
            if similarity > cfg.similarity_floor {
                similarity * cfg.similarity_scale
            } else {
                0.0
            }
        };

        if title < cfg.min_title_score {
            return None;
        }

        let api_date = candidate
            .start_datetime
            .as_deref()
            .and_then(parse_iso_instant)
            .map(|start| start.with_timezone(tz).date_naive());
        let date = match (scraped.date, api_date) {
            (Some(a), Some(b)) if a == b => cfg.same_day_score,
            (Some(a), Some(b)) if a.month() == b.month() && a.day() == b.day() => cfg.same_month_day_score,
            (Some(_), Some(_)) => cfg.date_mismatch_score,
            _ => cfg.unknown_date_score,
        };

        let mut total = if type_match && title < cfg.contains_score {
            title * cfg.type_led_title_weight + date * cfg.type_led_date_weight
        } else {
            title * cfg.title_weight + date * cfg.date_weight
        };
        if store_match {
            total = (total + cfg.store_bonus).min(1.0);
        }

        Some(CandidateScore {
            title,
            date,
            total,
            type_match,
            store_match,
        })
    }
}

/// Convenience wrapper with default thresholds.
pub fn find_match<'a>(scraped: &CanonicalEvent, candidates: &'a [ApiEvent]) -> Option<&'a ApiEvent> {
    EventMatcher::default().find_match(scraped, candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn api(id: u64, name: &str, store: &str, start: &str) -> ApiEvent {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": name,
            "start_datetime": start,
            "store": {"name": store},
        }))
        .unwrap()
    }

    fn scraped(title: &str, store: &str, date: &str) -> CanonicalEvent {
        CanonicalEvent {
            title: title.into(),
            store: store.into(),
            date: date.into(),
            ..Default::default()
        }
    }

    #[test]
    fn normalization_strips_decorations() {
        assert_eq!(
            normalize_title("Level Up Games - Johns Creek: Summoner Skirmish - Week 3"),
            "summoner skirmish"
        );
        assert_eq!(normalize_title("Riftbound Nexus Night #4"), "nexus night");
        assert_eq!(normalize_title("Sunday Afternoon Open Play - January"), "open play");
        assert_eq!(normalize_title("  Pre-Rift   Party!  "), "prerift party");
        assert_eq!(normalize_title(""), "");
    }

    #[test]
    fn similarity_variants() {
        assert_eq!(calculate_similarity("Nexus Night", "nexus night"), 1.0);
        assert!((calculate_similarity("nexus night", "nexus night at kapow") - 11.0 / 20.0).abs() < 1e-9);
        assert!((calculate_similarity("weekly summoner skirmish", "summoner skirmish weekly") - 1.0).abs() < 1e-9);
        assert_eq!(calculate_similarity("ab cd", "ef gh"), 0.0);
        assert_eq!(calculate_similarity("", "x"), 0.0);
    }

    #[test]
    fn tokens() {
        assert_eq!(extract_event_type("Kapow: Summoner Skirmish"), Some("summoner skirmish"));
        assert_eq!(extract_event_type("Casual Draft"), None);
        assert_eq!(extract_store_name("Level Up Games: Nexus Night"), Some("level up games".into()));
        assert_eq!(extract_store_name("Nexus Night"), None);
    }

    #[test]
    fn store_disagreement_vetoes_same_type() {
        let draft = scraped("Level Up Games: Summoner Skirmish", "Level Up Games", "Jan 4, 2026");
        let candidates = vec![api(1, "Another Store: Summoner Skirmish", "Another Store", "2026-01-04T19:00:00Z")];
        let matcher = EventMatcher::default();
        assert!(matcher.score_candidate(&draft, &candidates[0], &Utc).is_none());
        assert!(matcher.best_match_in(&draft, &candidates, &Utc).is_none());
    }

    #[test]
    fn identical_titles_at_different_stores_stay_vetoed() {
        let draft = scraped("Summoner Skirmish", "Level Up Games", "Jan 4, 2026");
        let candidates = vec![
            api(1, "Summoner Skirmish", "Another Store", "2026-01-04T19:00:00Z"),
            api(2, "Summoner Skirmish", "Level Up Games", "2026-01-04T19:00:00Z"),
        ];
        let matcher = EventMatcher::default();

        assert!(matcher.score_candidate(&draft, &candidates[0], &Utc).is_none());
        let found = matcher.best_match_in(&draft, &candidates, &Utc).unwrap();
        assert_eq!(found.event.id, 2);
    }

    #[test]
    fn same_store_and_date_is_accepted() {
        let draft = scraped("Level Up Games: Summoner Skirmish", "", "Jan 4, 2026");
        let candidates = vec![
            api(1, "Another Store: Summoner Skirmish", "Another Store", "2026-01-04T19:00:00Z"),
            api(2, "Summoner Skirmish", "Level Up Games - Johns Creek", "2026-01-04T19:00:00Z"),
        ];
        let found = EventMatcher::default().best_match_in(&draft, &candidates, &Utc).unwrap();
        assert_eq!(found.event.id, 2);
        assert!(found.score.store_match);
        assert!((found.score.total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn containment_scores_below_normalized_equality() {
        let draft = scraped("Nexus Night", "", "Jan 4, 2026");
        let candidates = vec![api(5, "Weekly Nexus Night Casual", "", "2026-01-04T19:00:00Z")];
        let score = EventMatcher::default()
            .score_candidate(&draft, &candidates[0], &Utc)
            .unwrap();
        // "nexus night" is contained in the API title
        assert_eq!(score.title, 0.85);
        assert!((score.total - (0.85 * 0.6 + 0.4)).abs() < 1e-9);
    }

    #[test]
    fn wrong_date_sinks_a_type_only_match() {
        let draft = scraped("Thursday Nexus Night", "", "Jan 4, 2026");
        let candidates = vec![api(5, "Nexus Night League", "", "2026-02-10T19:00:00Z")];
        let score = EventMatcher::default()
            .score_candidate(&draft, &candidates[0], &Utc)
            .unwrap();
        assert_eq!(score.title, 0.6);
        assert_eq!(score.date, 0.1);
        assert!(EventMatcher::default().best_match_in(&draft, &candidates, &Utc).is_none());
    }

    #[test]
    fn year_slip_scores_partial_date() {
        let draft = scraped("Nexus Night", "", "Jan 4, 2025");
        let candidates = vec![api(5, "Nexus Night", "", "2026-01-04T19:00:00Z")];
        let found = EventMatcher::default().best_match_in(&draft, &candidates, &Utc).unwrap();
        assert_eq!(found.score.date, 0.8);
    }

    #[test]
    fn matching_is_deterministic() {
        let draft = scraped("Summoner Skirmish", "", "Jan 4, 2026");
        let candidates = vec![
            api(1, "Summoner Skirmish", "", "2026-01-04T19:00:00Z"),
            api(2, "Summoner Skirmish", "", "2026-01-04T21:00:00Z"),
        ];
        let matcher = EventMatcher::default();
        let first = matcher.best_match_in(&draft, &candidates, &Utc).map(|m| m.event.id);
        let second = matcher.best_match_in(&draft, &candidates, &Utc).map(|m| m.event.id);
        assert_eq!(first, Some(1));
        assert_eq!(first, second);
    }

    #[test]
    fn thresholds_come_from_config() {
        let draft = scraped("Nexus Night", "", "");
        let candidates = vec![api(5, "Nexus Night", "", "2026-01-04T19:00:00Z")];
        // exact title, unknown date: 0.6 + 0.2 = 0.8
        let strict = EventMatcher::new(MatchConfig {
            accept_threshold: 0.9,
            ..MatchConfig::default()
        });
        assert!(strict.best_match_in(&draft, &candidates, &Utc).is_none());
        assert!(EventMatcher::default().best_match_in(&draft, &candidates, &Utc).is_some());
    }
}
