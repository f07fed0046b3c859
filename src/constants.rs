/// Endpoint and query constants shared by the API client, geocoders and
/// storage layer.

// Event API
pub const RIFTBOUND_API_BASE: &str = "https://api.cloudflare.riftbound.uvsgames.com/hydraproxy/api/v2";
pub const GAME_SLUG: &str = "riftbound";
pub const DISPLAY_STATUS_UPCOMING: &str = "upcoming";

// Rolling query window and paging
pub const QUERY_WINDOW_DAYS: i64 = 180;
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const SEARCH_PAGE_SIZE: u32 = 200;
pub const FETCH_ALL_PAGE_SIZE: u32 = 500;
pub const MAX_FETCH_ALL_PAGES: u32 = 10;
pub const DEFAULT_RADIUS_MILES: u32 = 50;

// "Fetch all" mode: center of the continental US with a radius covering North America
pub const FETCH_ALL_LATITUDE: f64 = 39.0;
pub const FETCH_ALL_LONGITUDE: f64 = -98.0;
pub const FETCH_ALL_RADIUS_MILES: u32 = 3000;

// Geocoding
pub const CENSUS_GEOCODER_URL: &str = "https://geocoding.geo.census.gov/geocoder/locations/onelineaddress";
pub const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const GEOCODER_USER_AGENT: &str = "RiftHub Event Scraper (https://github.com/j-ding/RiftHub)";
pub const MAX_SUGGESTIONS: usize = 5;
pub const SUGGESTION_DEBOUNCE_MS: u64 = 300;

// Storage keys
pub const KEY_MY_EVENTS: &str = "myEvents";
pub const KEY_MY_EVENTS_LAST_SYNC: &str = "myEventsLastSync";
pub const KEY_MY_EVENT_IDS: &str = "myEventIds";
pub const KEY_MY_EVENT_IDS_LAST_SYNC: &str = "myEventIdsLastSync";
pub const KEY_SEARCHED_EVENTS: &str = "searchedEvents";
pub const KEY_LAST_SEARCH_LOCATION: &str = "lastSearchLocation";
pub const KEY_FILTER_STATE: &str = "filterState";

/// Canonical display formats; `%-d`/`%-I` drop the leading zero.
pub const DATE_DISPLAY_FORMAT: &str = "%b %-d, %Y";
pub const TIME_DISPLAY_FORMAT: &str = "%-I:%M %p";
