// Event pipeline: classification, temporal checks, identity matching,
// enrichment and the calendar merge

pub mod classify;
pub mod enrich;
pub mod matcher;
pub mod merge;
pub mod temporal;

pub use matcher::{EventMatcher, MatchConfig};
pub use merge::{CalendarState, CalendarStore};
pub use temporal::is_past;
