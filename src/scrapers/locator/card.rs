use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};

/// Selectors tried when looking for listing cards. The one that yields the
/// most elements wins.
pub const CARD_SELECTORS: [&str; 6] = [
    r#"[class*="rounded-xl"][class*="border"][class*="shadow"]"#,
    r#"[data-testid*="event"]"#,
    r#"article[class*="event"]"#,
    ".event-card",
    r#"[class*="EventCard"]"#,
    r#"a[href*="/events/"]"#,
];

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"h3, h2, [class*="title"]"#).expect("title selector"));

static TIMESTAMP_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("[datetime], time, [data-datetime], [data-date]").expect("timestamp selector")
});

static DESCENDANT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("*").expect("descendant selector"));

const TIMESTAMP_ATTRIBUTES: [&str; 3] = ["datetime", "data-datetime", "data-date"];

/// Everything the extractor reads from one listing card, lifted out of the
/// DOM so extraction itself is a pure function over plain strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardView {
    /// Trimmed text of the first heading-like element, when there is one.
    pub heading: Option<String>,
    /// Concatenated text of the whole card, like DOM `textContent`.
    pub text: String,
    /// Machine-readable timestamp attribute values in document order.
    pub timestamps: Vec<String>,
    /// For each descendant element, its own text nodes trimmed and joined
    /// with a space. Text belonging to child elements is excluded.
    pub direct_texts: Vec<String>,
}

impl CardView {
    pub fn from_element(card: ElementRef<'_>) -> Self {
        let heading = card
            .select(&TITLE_SELECTOR)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string());

        let timestamps = card
            .select(&TIMESTAMP_SELECTOR)
            .filter_map(|el| {
                TIMESTAMP_ATTRIBUTES
                    .iter()
                    .find_map(|attr| el.value().attr(attr))
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| v.to_string())
            })
            .collect();

        let direct_texts = card
            .select(&DESCENDANT_SELECTOR)
            .map(|el| {
                el.children()
                    .filter_map(|child| match child.value() {
                        Node::Text(text) => Some(text.trim().to_string()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();

        Self {
            heading,
            text: card.text().collect(),
            timestamps,
            direct_texts,
        }
    }

    /// Parses a standalone card fragment; the first element is the card.
    pub fn from_fragment(html: &str) -> Option<Self> {
        let fragment = Html::parse_fragment(html);
        let root = fragment.root_element();
        let card = root.children().find_map(ElementRef::wrap)?;
        Some(Self::from_element(card))
    }
}

/// Finds listing cards on a full page using whichever selector matches the
/// most elements.
pub fn find_cards(document: &Html) -> Vec<ElementRef<'_>> {
    let mut best: Vec<ElementRef<'_>> = Vec::new();
    for selector in CARD_SELECTORS.iter().filter_map(|s| Selector::parse(s).ok()) {
        let found: Vec<ElementRef<'_>> = document.select(&selector).collect();
        if found.len() > best.len() {
            best = found;
        }
    }
    best
}
