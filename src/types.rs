use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a canonical record came from. API records are higher fidelity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    Scraped,
    Api,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Registered,
    #[default]
    Available,
}

/// Fixed event taxonomy. Declaration order is also the sort order used by
/// persisted filter maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum EventType {
    #[serde(rename = "Nexus Night")]
    NexusNight,
    #[serde(rename = "Summoner Skirmish")]
    SummonerSkirmish,
    #[serde(rename = "Pre/Release")]
    PreRelease,
    #[serde(rename = "Riftbound Open")]
    RiftboundOpen,
    #[serde(rename = "Regional")]
    Regional,
    #[serde(rename = "National")]
    National,
    #[serde(rename = "World Championship")]
    WorldChampionship,
    #[default]
    #[serde(rename = "Other")]
    Other,
}

impl EventType {
    pub const ALL: [EventType; 8] = [
        EventType::NexusNight,
        EventType::SummonerSkirmish,
        EventType::PreRelease,
        EventType::RiftboundOpen,
        EventType::Regional,
        EventType::National,
        EventType::WorldChampionship,
        EventType::Other,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EventType::NexusNight => "Nexus Night",
            EventType::SummonerSkirmish => "Summoner Skirmish",
            EventType::PreRelease => "Pre/Release",
            EventType::RiftboundOpen => "Riftbound Open",
            EventType::Regional => "Regional",
            EventType::National => "National",
            EventType::WorldChampionship => "World Championship",
            EventType::Other => "Other",
        }
    }

    /// Presentation color paired with the label.
    pub fn color(&self) -> &'static str {
        match self {
            EventType::NexusNight => "#3b82f6",
            EventType::SummonerSkirmish => "#10b981",
            EventType::PreRelease => "#14b8a6",
            EventType::RiftboundOpen => "#f97316",
            EventType::Regional => "#8b5cf6",
            EventType::National => "#ec4899",
            EventType::WorldChampionship => "#eab308",
            EventType::Other => "#64748b",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The unified event record produced by both card extraction and API
/// normalization.
///
/// Empty strings mean "not determined"; `capacity`/`registered` of `0` mean
/// unknown. `date` is always `"<Mon> <D>, <YYYY>"` when non-empty because the
/// calendar merge keys on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CanonicalEvent {
    pub id: Option<u64>,
    pub title: String,
    pub description: Option<String>,
    pub date: String,
    pub time: String,
    pub start_datetime: Option<String>,
    pub end_datetime: Option<String>,
    pub location: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub store: String,
    pub store_website: String,
    pub store_email: String,
    pub format: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub type_color: String,
    /// Raw `event_type` value reported by the API.
    #[serde(rename = "eventType")]
    pub api_event_type: Option<String>,
    pub price: String,
    pub price_in_cents: Option<i64>,
    pub currency: Option<String>,
    pub capacity: u32,
    pub registered: u32,
    pub players: String,
    pub image_url: Option<String>,
    pub status: Status,
    pub source: Source,
    pub is_registered: bool,
    pub extracted_at: Option<DateTime<Utc>>,
}

impl CanonicalEvent {
    /// Exact-match key used when merging registered and searched events.
    pub fn merge_key(&self) -> String {
        format!("{}-{}", self.title, self.date)
    }

    pub fn set_event_type(&mut self, event_type: EventType) {
        self.event_type = event_type;
        self.type_color = event_type.color().to_string();
    }

    pub fn is_free(&self) -> bool {
        self.price == "Free" || self.price_in_cents == Some(0)
    }

    /// Seats left when the API reported a capacity.
    pub fn spots_left(&self) -> Option<i64> {
        if self.capacity == 0 {
            return None;
        }
        Some(self.capacity as i64 - self.registered as i64)
    }
}

/// A resolved location, from the zip table or one of the geocoders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    pub display_name: String,
}

/// An autocomplete candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSuggestion {
    pub lat: f64,
    pub lng: f64,
    pub display_name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<LocationSuggestion> for GeoPoint {
    fn from(s: LocationSuggestion) -> Self {
        GeoPoint {
            lat: s.lat,
            lng: s.lng,
            display_name: s.display_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_key_joins_title_and_date() {
        let event = CanonicalEvent {
            title: "Nexus Night".into(),
            date: "Jan 4, 2026".into(),
            ..Default::default()
        };
        assert_eq!(event.merge_key(), "Nexus Night-Jan 4, 2026");
    }

    #[test]
    fn serializes_with_extension_field_names() {
        let mut event = CanonicalEvent {
            title: "Summoner Skirmish".into(),
            source: Source::Api,
            id: Some(42),
            is_registered: true,
            ..Default::default()
        };
        event.set_event_type(EventType::SummonerSkirmish);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "Summoner Skirmish");
        assert_eq!(value["typeColor"], "#10b981");
        assert_eq!(value["source"], "api");
        assert_eq!(value["isRegistered"], true);
        assert_eq!(value["status"], "available");
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let event: CanonicalEvent =
            serde_json::from_str(r#"{"title":"X","date":"Jan 4, 2026"}"#).unwrap();
        assert_eq!(event.event_type, EventType::Other);
        assert_eq!(event.source, Source::Scraped);
        assert_eq!(event.capacity, 0);
        assert!(event.id.is_none());
    }

    #[test]
    fn spots_left_requires_capacity() {
        let mut event = CanonicalEvent::default();
        assert_eq!(event.spots_left(), None);
        event.capacity = 16;
        event.registered = 14;
        assert_eq!(event.spots_left(), Some(2));
    }
}
