// Observability: logging and counters

pub mod metrics;

pub use crate::logging::init_logging;
