use super::card::{find_cards, CardView};
use super::patterns::*;
use crate::observability::metrics;
use crate::pipeline::classify::classify_scraped_title;
use crate::pipeline::temporal::{
    format_display_date, format_display_time, parse_display_date, parse_iso_instant,
};
use crate::types::{CanonicalEvent, Source, Status};
use chrono::{Local, TimeZone, Utc};
use scraper::Html;
use tracing::{debug, info, instrument, warn};

/// Date and time found on a card, and where they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub date: Option<String>,
    pub time: Option<String>,
    pub from_timestamp: bool,
}

/// Turns one card into an event draft, reading wall-clock values in the
/// viewer's zone. `None` when the card has no heading text.
pub fn extract_event(card: &CardView) -> Option<CanonicalEvent> {
    extract_event_in(card, &Local)
}

pub fn extract_event_in<Tz: TimeZone>(card: &CardView, tz: &Tz) -> Option<CanonicalEvent>
where
    Tz::Offset: std::fmt::Display,
{
    let title = card.heading.as_deref().map(str::trim).filter(|t| !t.is_empty())?;

    let schedule = extract_schedule(card, tz);
    let mut event = CanonicalEvent {
        title: title.to_string(),
        date: schedule.date.unwrap_or_default(),
        time: schedule.time.unwrap_or_default(),
        price: extract_price(&card.text).unwrap_or_default(),
        format: extract_format(&card.text).unwrap_or_default().to_string(),
        players: extract_players(&card.text).unwrap_or_default(),
        store: extract_store(&card.text).unwrap_or_default(),
        location: extract_location(&card.text).unwrap_or_default(),
        status: Status::Registered,
        source: Source::Scraped,
        extracted_at: Some(Utc::now()),
        ..Default::default()
    };
    event.set_event_type(classify_scraped_title(title));
    Some(event)
}

/// Extracts every usable card on a page. Cards without a title and cards
/// marked completed or cancelled are skipped; one bad card never stops the
/// rest.
#[instrument(skip(html), fields(bytes = html.len()))]
pub fn extract_events(html: &str) -> Vec<CanonicalEvent> {
    extract_events_in(html, &Local)
}

pub fn extract_events_in<Tz: TimeZone>(html: &str, tz: &Tz) -> Vec<CanonicalEvent>
where
    Tz::Offset: std::fmt::Display,
{
    let document = Html::parse_document(html);
    let cards = find_cards(&document);
    info!("Found {} event cards", cards.len());

    let mut events = Vec::new();
    for (index, element) in cards.into_iter().enumerate() {
        let card = CardView::from_element(element);

        if let Some(marker) = INACTIVE_MARKERS.iter().find(|m| card.text.contains(*m)) {
            debug!(index, marker, "Skipping inactive card");
            metrics::extraction::card_skipped("inactive");
            continue;
        }

        match extract_event_in(&card, tz) {
            Some(event) => {
                metrics::extraction::card_extracted();
                events.push(event);
            }
            None => {
                warn!(index, "Event card has no title, skipping");
                metrics::extraction::card_skipped("no_title");
            }
        }
    }
    events
}

/// Timestamp attributes first (exact, and they carry the time too); then a
/// date-shaped substring and the time pattern cascade.
pub fn extract_schedule<Tz: TimeZone>(card: &CardView, tz: &Tz) -> Schedule
where
    Tz::Offset: std::fmt::Display,
{
    if let Some(instant) = card.timestamps.iter().find_map(|v| parse_iso_instant(v)) {
        let local = instant.with_timezone(tz);
        return Schedule {
            date: Some(format_display_date(&local)),
            time: Some(format_display_time(&local)),
            from_timestamp: true,
        };
    }

    Schedule {
        date: extract_text_date(&card.text),
        time: extract_text_time(card),
        from_timestamp: false,
    }
}

/// First `<Mon> <D>, <YYYY>` substring that names a real month, rewritten
/// to the canonical spacing.
pub fn extract_text_date(text: &str) -> Option<String> {
    DATE_PATTERN
        .find_iter(text)
        .find_map(|m| parse_display_date(m.as_str()))
        .map(|day| day.format(crate::constants::DATE_DISPLAY_FORMAT).to_string())
}

pub fn extract_text_time(card: &CardView) -> Option<String> {
    let normalized = card.text.split_whitespace().collect::<Vec<_>>().join(" ");
    if let Some((rule, value)) = first_match(&TIME_RULES, &normalized) {
        debug!(rule, "Matched card time");
        return Some(value.trim().to_string());
    }

    // Per-element scan so a time is never stitched together from two
    // unrelated elements.
    card.direct_texts
        .iter()
        .find_map(|text| DIRECT_TIME_RULE.capture(text))
        .map(|value| value.trim().to_string())
}

pub fn extract_price(text: &str) -> Option<String> {
    if FREE_MARKERS.iter().any(|marker| text.contains(marker)) {
        return Some("Free".to_string());
    }
    PRICE_PATTERN.find(text).map(|m| m.as_str().to_string())
}

pub fn extract_format(text: &str) -> Option<&'static str> {
    FORMAT_TOKENS.iter().copied().find(|token| text.contains(token))
}

pub fn extract_players(text: &str) -> Option<String> {
    PLAYERS_PATTERN.find(text).map(|m| m.as_str().to_string())
}

pub fn extract_store(text: &str) -> Option<String> {
    STORE_RULES.iter().find_map(|rule| {
        let raw = rule.capture(text)?;
        let name = COUNTRY_SUFFIX.replace(raw.trim(), "").trim().to_string();
        (name.chars().count() > 2).then_some(name)
    })
}

pub fn extract_location(text: &str) -> Option<String> {
    first_match(&LOCATION_RULES, text)
        .map(|(_, raw)| COUNTRY_SUFFIX.replace(raw, "").trim().to_string())
        .filter(|location| !location.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventType;

    fn card(html: &str) -> CardView {
        CardView::from_fragment(html).unwrap()
    }

    #[test]
    fn card_without_heading_is_rejected() {
        let view = card(r#"<div><p>Jan 4, 2026 7:00 PM</p></div>"#);
        assert!(extract_event_in(&view, &Utc).is_none());
    }

    #[test]
    fn timestamp_attribute_drives_date_and_time() {
        let view = card(
            r#"<div><h3>Nexus Night</h3>
               <time datetime="2026-01-04T19:30:00Z">Sun</time>
               <p>Feb 9, 2026 at 10:00 AM</p></div>"#,
        );
        let event = extract_event_in(&view, &Utc).unwrap();
        assert_eq!(event.date, "Jan 4, 2026");
        assert_eq!(event.time, "7:30 PM");
        assert_eq!(event.event_type, EventType::NexusNight);
    }

    #[test]
    fn unparseable_timestamp_falls_back_to_text() {
        let view = card(
            r#"<div><h3>Summoner Skirmish</h3><span data-date="soon"></span>
               <p>Feb 9, 2026</p>
               <p>6:30 PM (EST)</p></div>"#,
        );
        let event = extract_event_in(&view, &Utc).unwrap();
        assert_eq!(event.date, "Feb 9, 2026");
        assert_eq!(event.time, "6:30 PM (EST)");
    }

    #[test]
    fn text_date_is_canonicalized() {
        assert_eq!(extract_text_date("When: Mar  7,  2026"), Some("Mar 7, 2026".into()));
        assert_eq!(extract_text_date("Sun 7, 2026 then Apr 2, 2026"), Some("Apr 2, 2026".into()));
        assert_eq!(extract_text_date("no date"), None);
    }

    #[test]
    fn direct_text_scan_is_the_last_resort() {
        let view = CardView {
            heading: Some("Open Play".into()),
            text: "Open Play Starts at 7".into(),
            timestamps: vec![],
            direct_texts: vec!["Open Play".into(), "Doors 7:15 PM".into()],
        };
        assert_eq!(extract_text_time(&view), Some("7:15 PM".into()));
    }

    #[test]
    fn price_prefers_free_marker() {
        assert_eq!(extract_price("Free Event $5.00 deposit"), Some("Free".into()));
        assert_eq!(extract_price("Entry € 12.50"), Some("€ 12.50".into()));
        assert_eq!(extract_price("Entry TBD"), None);
    }

    #[test]
    fn constructed_wins_over_sealed() {
        assert_eq!(extract_format("Sealed then Constructed"), Some("Constructed"));
        assert_eq!(extract_format("Sealed"), Some("Sealed"));
        assert_eq!(extract_format("Draft"), None);
    }

    #[test]
    fn players_keeps_the_whole_phrase() {
        assert_eq!(extract_players("16 Players registered"), Some("16 Players".into()));
        assert_eq!(extract_players("1 Player"), Some("1 Player".into()));
    }

    #[test]
    fn store_and_location_are_best_effort() {
        assert_eq!(extract_store("Kapow Comics LLC - US"), Some("Kapow Comics LLC".into()));
        assert_eq!(extract_store("no store here"), None);
        assert_eq!(extract_location("Johns Creek, GA - US"), Some("Johns Creek, GA".into()));
        assert_eq!(extract_location("somewhere"), None);
    }

    #[test]
    fn page_extraction_skips_inactive_and_untitled_cards() {
        let html = r#"<html><body>
            <div class="event-card"><h3>Nexus Night</h3><p>Jan 4, 2026</p><p>Free Event</p></div>
            <div class="event-card"><h3>Summoner Skirmish</h3><p>Completed</p></div>
            <div class="event-card"><p>No heading</p></div>
            <div class="event-card"><h2>Regional Qualifier</h2><p>$25 Sealed 32 Players</p></div>
        </body></html>"#;
        let events = extract_events_in(html, &Utc);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "Nexus Night");
        assert_eq!(events[0].price, "Free");
        assert_eq!(events[1].event_type, EventType::Regional);
        assert_eq!(events[1].format, "Sealed");
        assert_eq!(events[1].players, "32 Players");
        assert!(events.iter().all(|e| e.source == Source::Scraped));
    }
}
