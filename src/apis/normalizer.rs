use super::models::ApiEvent;
use crate::pipeline::classify::classify_api_name;
use crate::pipeline::temporal::{format_display_date, format_display_time, parse_iso_instant};
use crate::types::{CanonicalEvent, Source, Status};
use chrono::{Local, TimeZone, Utc};

const DEFAULT_CURRENCY: &str = "USD";

fn currency_symbol(currency: &str) -> &'static str {
    match currency {
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        _ => "",
    }
}

/// `"Free"` for zero cents, otherwise symbol plus amount to two decimals.
pub fn format_price(cents: i64, currency: &str) -> String {
    if cents == 0 {
        return "Free".to_string();
    }
    format!("{}{:.2}", currency_symbol(currency), cents as f64 / 100.0)
}

/// Maps an API record to the canonical shape, rendering date and time in
/// the viewer's zone.
pub fn transform_api_event(raw: &ApiEvent) -> CanonicalEvent {
    transform_api_event_in(raw, &Local)
}

pub fn transform_api_event_in<Tz: TimeZone>(raw: &ApiEvent, tz: &Tz) -> CanonicalEvent
where
    Tz::Offset: std::fmt::Display,
{
    let (date, time) = raw
        .start_datetime
        .as_deref()
        .and_then(parse_iso_instant)
        .map(|start| {
            let local = start.with_timezone(tz);
            (format_display_date(&local), format_display_time(&local))
        })
        .unwrap_or_default();

    let cents = raw.cost_in_cents.unwrap_or(0);
    let currency = raw
        .currency
        .clone()
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    let store = raw.store.clone().unwrap_or_default();

    let mut event = CanonicalEvent {
        id: Some(raw.id),
        title: raw.name().to_string(),
        description: raw.description.clone(),
        date,
        time,
        start_datetime: raw.start_datetime.clone(),
        end_datetime: raw.end_datetime.clone(),
        location: raw.full_address.clone().unwrap_or_default(),
        city: store.city.unwrap_or_default(),
        state: store.state.unwrap_or_default(),
        country: store.country.unwrap_or_default(),
        latitude: raw.latitude,
        longitude: raw.longitude,
        store: store.name.unwrap_or_default(),
        store_website: store.website.unwrap_or_default(),
        store_email: store.email.unwrap_or_default(),
        format: raw.event_format.clone().unwrap_or_default(),
        api_event_type: raw.event_type.clone(),
        price: format_price(cents, &currency),
        price_in_cents: Some(cents),
        currency: Some(currency),
        capacity: raw.capacity.unwrap_or(0),
        registered: raw.registered_user_count.unwrap_or(0),
        image_url: raw.full_header_image_url.clone(),
        status: Status::Available,
        source: Source::Api,
        extracted_at: Some(Utc::now()),
        ..Default::default()
    };
    event.set_event_type(classify_api_name(raw.name()));
    event
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventType;
    use chrono::FixedOffset;

    fn raw(json: &str) -> ApiEvent {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn prices() {
        assert_eq!(format_price(0, "USD"), "Free");
        assert_eq!(format_price(1500, "USD"), "$15.00");
        assert_eq!(format_price(999, "EUR"), "€9.99");
        assert_eq!(format_price(250, "GBP"), "£2.50");
        assert_eq!(format_price(1000, "JPY"), "10.00");
    }

    #[test]
    fn start_instant_is_rendered_in_viewer_zone() {
        let event = raw(r#"{"id": 42, "name": "Summoner Skirmish", "start_datetime": "2026-01-05T00:30:00Z"}"#);
        let eastern = FixedOffset::west_opt(5 * 3600).unwrap();
        let canonical = transform_api_event_in(&event, &eastern);
        assert_eq!(canonical.date, "Jan 4, 2026");
        assert_eq!(canonical.time, "7:30 PM");
        assert_eq!(canonical.event_type, EventType::SummonerSkirmish);
        assert_eq!(canonical.type_color, "#10b981");
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let canonical = transform_api_event_in(&raw(r#"{"id": 3}"#), &Utc);
        assert_eq!(canonical.id, Some(3));
        assert_eq!(canonical.source, Source::Api);
        assert_eq!(canonical.status, Status::Available);
        assert_eq!(canonical.price, "Free");
        assert_eq!(canonical.currency.as_deref(), Some("USD"));
        assert_eq!(canonical.date, "");
        assert_eq!(canonical.capacity, 0);
        assert_eq!(canonical.event_type, EventType::Other);
    }

    #[test]
    fn store_fields_are_flattened() {
        let canonical = transform_api_event_in(
            &raw(
                r#"{"id": 9, "name": "Pre-Release Open Play", "cost_in_cents": 3500,
                    "full_address": "1 Main St, Duluth, GA", "capacity": 24, "registered_user_count": 10,
                    "store": {"name": "Level Up Games", "city": "Duluth", "state": "GA", "website": "https://levelup.example"}}"#,
            ),
            &Utc,
        );
        assert_eq!(canonical.event_type, EventType::PreRelease);
        assert_eq!(canonical.price, "$35.00");
        assert_eq!(canonical.store, "Level Up Games");
        assert_eq!(canonical.city, "Duluth");
        assert_eq!(canonical.location, "1 Main St, Duluth, GA");
        assert_eq!(canonical.spots_left(), Some(14));
    }
}
