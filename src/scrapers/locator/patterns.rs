//! Ordered text-pattern tables used by the card extractor.
//!
//! Every table is evaluated top to bottom and the first rule that yields a
//! value wins. Rules are plain data so each one can be tested on its own.

use once_cell::sync::Lazy;
use regex::Regex;

/// One entry of an ordered pattern table. `group` selects the capture that
/// holds the value (0 for the whole match).
pub struct PatternRule {
    pub name: &'static str,
    pub regex: Regex,
    pub group: usize,
}

impl PatternRule {
    fn new(name: &'static str, pattern: &str, group: usize) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).expect("static extractor pattern"),
            group,
        }
    }

    pub fn capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.regex
            .captures(text)
            .and_then(|c| c.get(self.group))
            .map(|m| m.as_str())
    }
}

/// Returns the first value produced by any rule, with the rule's name.
pub fn first_match<'t>(rules: &[PatternRule], text: &'t str) -> Option<(&'static str, &'t str)> {
    rules
        .iter()
        .find_map(|rule| rule.capture(text).map(|value| (rule.name, value)))
}

/// `<Mon> <D>, <YYYY>` anywhere in the card text.
pub static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z][a-z]{2}\s+\d{1,2},\s+\d{4}").expect("date pattern"));

/// Most specific first: zone in parentheses, bare zone token, bare time.
/// The leading `(?:^|[^\d])` keeps a date's digits from being read as an hour.
pub static TIME_RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    vec![
        PatternRule::new(
            "time_with_parenthesized_zone",
            r"(?:^|[^\d])(\d{1,2}:\d{2}\s*(?i:AM|PM)\s*\([A-Z]{2,4}\))",
            1,
        ),
        PatternRule::new(
            "time_with_zone_token",
            r"(?:^|[^\d])(\d{1,2}:\d{2}\s*(?i:AM|PM)\s+[A-Z]{2,4})\b",
            1,
        ),
        PatternRule::new("bare_time", r"(?:^|[^\d])(\d{1,2}:\d{2}\s*(?i:AM|PM))", 1),
    ]
});

/// Applied to each element's own text when the whole-card scan found nothing.
pub static DIRECT_TIME_RULE: Lazy<PatternRule> =
    Lazy::new(|| PatternRule::new("direct_bare_time", r"(?:^|[^\d])(\d{1,2}:\d{2}\s*(?i:AM|PM))", 1));

/// Literal markers for free events, checked before any currency amount.
pub const FREE_MARKERS: [&str; 2] = ["Free Event", "Free"];

pub static PRICE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\$€£¥₹]\s*\d+(?:\.\d{2})?").expect("price pattern"));

/// Earlier entries win when several appear in the same card.
pub const FORMAT_TOKENS: [&str; 2] = ["Constructed", "Sealed"];

pub static PLAYERS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*Players?").expect("players pattern"));

pub static STORE_RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    vec![
        PatternRule::new(
            "name_before_country_suffix",
            r"(?i)([A-Za-z0-9\s'&]+(?:LLC|Games|Gaming|Cafe|Comics|Hobby|Store|Brew)?(?:\s+[A-Za-z\s]+)?)\s*-\s*US\b",
            1,
        ),
        PatternRule::new("pin_prefixed", r"📍\s*([^\n]+)", 1),
        PatternRule::new("shop_prefixed", r"🏪\s*([^\n]+)", 1),
    ]
});

pub static LOCATION_RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    vec![PatternRule::new(
        "city_state_before_country_suffix",
        r"([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?),?\s*([A-Z]{2})\s*-?\s*US",
        0,
    )]
});

/// Trailing `- US` country suffix left on store and location captures.
pub static COUNTRY_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*-?\s*US$").expect("country suffix pattern"));

/// Cards carrying any of these are not upcoming registrations.
pub const INACTIVE_MARKERS: [&str; 3] = ["Completed", "Cancelled", "Canceled"];
