use crate::constants::*;
use crate::error::{Result, ScraperError};
use crate::pipeline::matcher::MatchConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Runtime configuration. Every field has a default so an absent or partial
/// `config.toml` is fine.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub geocoding: GeocodingConfig,
    pub matching: MatchConfig,
    pub storage: StorageConfig,
    pub autocomplete: AutocompleteConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub game_slug: String,
    pub search_page_size: u32,
    pub fetch_all_page_size: u32,
    pub max_pages: u32,
    pub window_days: i64,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: RIFTBOUND_API_BASE.to_string(),
            game_slug: GAME_SLUG.to_string(),
            search_page_size: SEARCH_PAGE_SIZE,
            fetch_all_page_size: FETCH_ALL_PAGE_SIZE,
            max_pages: MAX_FETCH_ALL_PAGES,
            window_days: QUERY_WINDOW_DAYS,
            timeout_seconds: 30,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub census_url: String,
    pub nominatim_url: String,
    pub user_agent: String,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            census_url: CENSUS_GEOCODER_URL.to_string(),
            nominatim_url: NOMINATIM_SEARCH_URL.to_string(),
            user_agent: GEOCODER_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/store"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AutocompleteConfig {
    pub debounce_ms: u64,
    pub max_suggestions: usize,
}

impl Default for AutocompleteConfig {
    fn default() -> Self {
        Self {
            debounce_ms: SUGGESTION_DEBOUNCE_MS,
            max_suggestions: MAX_SUGGESTIONS,
        }
    }
}

impl AutocompleteConfig {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Config {
    /// Loads `config.toml` from the working directory when present, then
    /// applies environment overrides (`.env` is honored).
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                ScraperError::Config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        config.apply_env();
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(base) = std::env::var("RIFT_API_BASE") {
            self.api.base_url = base;
        }
        if let Ok(dir) = std::env::var("RIFT_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Ok(agent) = std::env::var("RIFT_USER_AGENT") {
            self.geocoding.user_agent = agent;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.api.max_pages == 0 {
            return Err(ScraperError::Config("api.max_pages must be at least 1".into()));
        }
        if self.api.fetch_all_page_size == 0 || self.api.search_page_size == 0 {
            return Err(ScraperError::Config("page sizes must be positive".into()));
        }
        Ok(())
    }
}
