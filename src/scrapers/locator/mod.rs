//! Event locator pages: listing cards and the registered-events page.

pub mod card;
pub mod extractor;
pub mod my_events;
pub mod patterns;

pub use card::CardView;
pub use extractor::{extract_event, extract_events};
pub use my_events::extract_event_ids;
