#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rift_scraper::app::ports::{HttpClientPort, HttpGetResult};
use rift_scraper::error::Result;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

type Responder = Box<dyn Fn(&str) -> (u16, String) + Send + Sync>;

/// In-process HTTP fake: answers every GET through a closure and records
/// the requested URLs.
pub struct FakeHttp {
    responder: Responder,
    calls: Mutex<Vec<String>>,
}

impl FakeHttp {
    pub fn new(responder: impl Fn(&str) -> (u16, String) + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Fails the test if anything goes to the network.
    pub fn offline() -> Arc<Self> {
        Self::new(|url| panic!("unexpected request to {}", url))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpClientPort for FakeHttp {
    async fn get(&self, url: &str, _headers: &[(&'static str, String)]) -> Result<HttpGetResult> {
        self.calls.lock().unwrap().push(url.to_string());
        let (status, body) = (self.responder)(url);
        Ok(HttpGetResult {
            status,
            bytes: body.into_bytes(),
            content_type: "application/json".into(),
        })
    }
}

pub fn api_record(id: u64, name: &str, start: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "start_datetime": start,
        "cost_in_cents": 0,
        "currency": "USD",
        "capacity": 16,
        "registered_user_count": 4,
        "store": {"name": "Kapow Comics LLC", "city": "Alpharetta", "state": "GA", "country": "US"}
    })
}

pub fn page(records: Vec<Value>) -> String {
    json!({ "count": records.len(), "results": records }).to_string()
}

/// Value of a query parameter in a requested URL.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let value = parsed
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned());
    value
}

pub fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("missing fixture {}: {}", path, e))
}
