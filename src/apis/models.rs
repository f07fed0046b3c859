use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One event record as returned by the events API. Only `id` is required;
/// everything else is optional because the API omits or nulls fields freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEvent {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_datetime: Option<String>,
    #[serde(default)]
    pub end_datetime: Option<String>,
    #[serde(default)]
    pub full_address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub cost_in_cents: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub registered_user_count: Option<u32>,
    #[serde(default)]
    pub event_format: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub full_header_image_url: Option<String>,
    #[serde(default)]
    pub store: Option<ApiStore>,
}

impl ApiEvent {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn store_name(&self) -> &str {
        self.store
            .as_ref()
            .and_then(|s| s.name.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiStore {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// One page of the events listing. Records are kept as raw JSON so a single
/// malformed record can be skipped without losing the page.
#[derive(Debug, Deserialize)]
pub struct EventsPage {
    #[serde(default)]
    pub results: Vec<Value>,
}
