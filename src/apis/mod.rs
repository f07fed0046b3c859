//! Event API client, record normalization and location lookup.

pub mod geocode;
pub mod models;
pub mod normalizer;
pub mod riftbound;
pub mod zipcodes;

pub use geocode::Geocoder;
pub use models::{ApiEvent, ApiStore};
pub use normalizer::{format_price, transform_api_event};
pub use riftbound::{EventQuery, FetchedPage, RiftboundClient, SearchArea};
