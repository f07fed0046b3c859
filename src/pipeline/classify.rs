//! Keyword-table event classification.
//!
//! Each table is evaluated in order against a lower-cased title; the first
//! entry with any matching keyword wins and unmatched titles fall back to
//! [`EventType::Other`].

use crate::types::EventType;

pub type KeywordTable = &'static [(EventType, &'static [&'static str])];

/// Table applied to titles scraped from listing cards.
pub const SCRAPED_TITLE_TABLE: KeywordTable = &[
    (EventType::NexusNight, &["nexus night"]),
    (EventType::SummonerSkirmish, &["summoner skirmish"]),
    (EventType::RiftboundOpen, &["riftbound open", "open play"]),
    (EventType::Regional, &["regional"]),
    (EventType::National, &["national"]),
    (EventType::WorldChampionship, &["world"]),
];

/// Table applied to API event names. Pre/Release sits ahead of the open play
/// entry so "Pre-Release Open Play" is not filed as an open.
pub const API_NAME_TABLE: KeywordTable = &[
    (EventType::SummonerSkirmish, &["summoner skirmish"]),
    (EventType::NexusNight, &["nexus night"]),
    (
        EventType::PreRelease,
        &["prerelease", "pre-release", "pre-rift", "release"],
    ),
    (EventType::RiftboundOpen, &["riftbound open", "open play"]),
    (EventType::Regional, &["regional"]),
    (EventType::National, &["national"]),
    (EventType::WorldChampionship, &["world"]),
];

pub fn classify(title: &str, table: KeywordTable) -> EventType {
    let lower = title.to_lowercase();
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(event_type, _)| *event_type)
        .unwrap_or(EventType::Other)
}

pub fn classify_scraped_title(title: &str) -> EventType {
    classify(title, SCRAPED_TITLE_TABLE)
}

pub fn classify_api_name(name: &str) -> EventType {
    classify(name, API_NAME_TABLE)
}
