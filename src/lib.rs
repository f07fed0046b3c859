pub mod apis;
pub mod autocomplete;
pub mod config;
pub mod constants;
pub mod error;
pub mod filters;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod scrapers;
pub mod storage;
pub mod types;

// Layered boundaries for application use cases and infrastructure adapters
pub mod app;
pub mod infra;
