use crate::observability::metrics;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::info;

static EVENT_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="/events/"]"#).expect("event link selector"));

static EVENT_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/events/(\d+)").expect("event id pattern"));

/// Numeric event IDs linked from a "my events" page, deduplicated, in the
/// order they first appear.
pub fn extract_event_ids(html: &str) -> Vec<u64> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let ids: Vec<u64> = document
        .select(&EVENT_LINK_SELECTOR)
        .filter_map(|link| link.value().attr("href"))
        .filter_map(|href| EVENT_ID_RE.captures(href))
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u64>().ok())
        .filter(|id| seen.insert(*id))
        .collect();

    info!("Found {} registered event IDs", ids.len());
    metrics::extraction::ids_found(ids.len());
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_ordered() {
        let html = r#"<ul>
            <li><a href="https://locator.riftbound.uvsgames.com/events/318/">A</a></li>
            <li><a href="/events/42">B</a></li>
            <li><a href="/events/318?tab=info">A again</a></li>
            <li><a href="/events/new">Create</a></li>
            <li><a href="/stores/9">Store</a></li>
        </ul>"#;
        assert_eq!(extract_event_ids(html), vec![318, 42]);
    }

    #[test]
    fn page_without_links_yields_nothing() {
        assert!(extract_event_ids("<p>Sign in to see your events</p>").is_empty());
    }
}
