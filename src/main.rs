use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use rift_scraper::apis::{Geocoder, RiftboundClient};
use rift_scraper::app::ports::HttpClientPort;
use rift_scraper::app::{
    RefreshUseCase, SearchOutcome, SearchRequest, SearchUseCase, SyncReport, SyncUseCase,
};
use rift_scraper::autocomplete::Autocomplete;
use rift_scraper::config::Config;
use rift_scraper::constants::{self, KEY_MY_EVENTS_LAST_SYNC};
use rift_scraper::filters::SearchFilter;
use rift_scraper::infra::ReqwestHttp;
use rift_scraper::logging;
use rift_scraper::pipeline::{CalendarStore, EventMatcher};
use rift_scraper::scrapers::locator::extract_events;
use rift_scraper::storage::{self, JsonFileStorage, Scope, Storage};
use rift_scraper::types::CanonicalEvent;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "rift_scraper")]
#[command(about = "Riftbound event locator scraper and calendar sync")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract event cards from a saved locator page
    Scrape {
        #[arg(long)]
        html: PathBuf,
        /// Replace the registered-event cache with the extracted events
        #[arg(long)]
        save: bool,
    },
    /// Collect registered event IDs from a saved My Events page
    Ids {
        #[arg(long)]
        html: PathBuf,
    },
    /// Resolve registered event IDs against the API (comma-separated, or the saved list)
    Sync {
        #[arg(long)]
        ids: Option<String>,
    },
    /// Re-enrich cached registered events with API details
    Refresh,
    /// Search for events near a location
    Search {
        #[arg(long)]
        location: String,
        #[arg(long, default_value_t = constants::DEFAULT_RADIUS_MILES)]
        radius: u32,
        /// One of: all, nexus, skirmish, prerelease, open, free
        #[arg(long, default_value = "all")]
        filter: String,
    },
    /// Location suggestions for a partial query
    Suggest { query: String },
    /// Calendar events, optionally for one day
    Events {
        /// Day in YYYY-MM-DD
        #[arg(long)]
        day: Option<String>,
    },
    /// Registered events, earliest first
    MyEvents,
    /// Forget the last search results
    ClearSearch,
    /// Remove every cached event
    ClearCache,
}

struct App {
    config: Config,
    http: Arc<dyn HttpClientPort>,
    store: Arc<CalendarStore>,
}

impl App {
    fn new(config: Config) -> Result<Self> {
        let http: Arc<dyn HttpClientPort> = Arc::new(ReqwestHttp::new(config.api.timeout())?);
        let storage: Arc<dyn Storage> = Arc::new(JsonFileStorage::new(config.storage.data_dir.clone()));
        Ok(Self {
            config,
            http,
            store: Arc::new(CalendarStore::new(storage)),
        })
    }

    fn client(&self) -> RiftboundClient {
        RiftboundClient::new(self.http.clone(), self.config.api.clone())
    }

    fn geocoder(&self) -> Geocoder {
        Geocoder::new(
            self.http.clone(),
            self.config.geocoding.clone(),
            self.config.autocomplete.max_suggestions,
        )
    }

    fn sync(&self) -> SyncUseCase {
        SyncUseCase::new(self.client(), self.store.clone())
    }
}

fn read_page(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn parse_ids(csv: &str) -> Result<Vec<u64>> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u64>().with_context(|| format!("Invalid event id '{}'", s)))
        .collect()
}

fn print_events(events: &[CanonicalEvent]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(events)?);
    Ok(())
}

fn print_sync(report: &SyncReport) {
    println!(
        "✅ Synced {} upcoming events ({} past removed), calendar holds {}",
        report.events.len(),
        report.past,
        report.calendar.events.len()
    );
}

async fn run(app: &App, command: Commands) -> Result<()> {
    match command {
        Commands::Scrape { html, save } => {
            let page = read_page(&html)?;
            if save {
                let report = app.sync().sync_scraped(&page).await?;
                print_events(&report.events)?;
                print_sync(&report);
            } else {
                print_events(&extract_events(&page))?;
            }
        }
        Commands::Ids { html } => {
            let page = read_page(&html)?;
            let ids = app.sync().save_ids_from_page(&page).await?;
            if ids.is_empty() {
                println!("⚠️  No event links found on page");
            } else {
                println!("📋 Saved {} event IDs: {:?}", ids.len(), ids);
            }
        }
        Commands::Sync { ids } => {
            let sync = app.sync();
            let ids = match ids {
                Some(csv) => parse_ids(&csv)?,
                None => sync.saved_ids().await?,
            };
            if ids.is_empty() {
                println!("⚠️  No event IDs to sync. Run `ids --html <page>` first.");
                return Ok(());
            }
            let progress = |done: usize, total: usize| info!("Fetching event details ({}/{})", done, total);
            let report = sync.sync_ids(&ids, &progress).await?;
            print_sync(&report);
        }
        Commands::Refresh => {
            let refresh = RefreshUseCase::new(
                app.client(),
                EventMatcher::new(app.config.matching.clone()),
                app.store.clone(),
            );
            match refresh.refresh().await? {
                Some(report) => println!(
                    "✅ Updated {}/{} events with full details",
                    report.from_api,
                    report.events.len()
                ),
                None => println!("⚠️  No events to refresh. Sync first!"),
            }
        }
        Commands::Search {
            location,
            radius,
            filter,
        } => {
            let filter: SearchFilter = filter.parse()?;
            let search = SearchUseCase::new(app.client(), app.geocoder(), app.store.clone());
            let request = SearchRequest::new(location)
                .with_radius(radius)
                .with_filter(filter);
            match search.search(&request).await? {
                SearchOutcome::LocationNotFound => {
                    println!("❌ Location not found. Try a zip code or \"City, State\".")
                }
                SearchOutcome::NoEvents {
                    location,
                    radius_miles,
                } => println!(
                    "📭 No events within {} miles of {}",
                    radius_miles, location.display_name
                ),
                SearchOutcome::Found {
                    events,
                    location,
                    radius_miles,
                    ..
                } => {
                    print_events(&events)?;
                    println!(
                        "📍 Found {} {}events within {} miles of {}",
                        events.len(),
                        filter.label(),
                        radius_miles,
                        location.display_name
                    );
                }
            }
        }
        Commands::Suggest { query } => {
            let autocomplete = Autocomplete::new(Arc::new(app.geocoder()), app.config.autocomplete.quiet_period());
            let mut updates = autocomplete.subscribe();
            autocomplete.on_input(&query);
            let wait = app.config.autocomplete.quiet_period() + app.config.api.timeout();
            if tokio::time::timeout(wait, updates.changed()).await.is_err() {
                println!("⚠️  No suggestions before timeout");
                return Ok(());
            }
            for suggestion in autocomplete.state().suggestions {
                println!(
                    "{} ({}) [{:.4}, {:.4}]",
                    suggestion.display_name, suggestion.kind, suggestion.lat, suggestion.lng
                );
            }
        }
        Commands::Events { day } => {
            let calendar = app.store.load().await?;
            match day {
                Some(day) => {
                    let day = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                        .with_context(|| format!("Invalid day '{}'", day))?;
                    let events: Vec<CanonicalEvent> =
                        calendar.events_for_day(day).into_iter().cloned().collect();
                    print_events(&events)?;
                }
                None => print_events(&calendar.events)?,
            }
        }
        Commands::MyEvents => {
            let calendar = app.store.load().await?;
            let events = calendar.registered_sorted(&Local);
            if events.is_empty() {
                println!("📭 No registered events found");
                return Ok(());
            }
            print_events(&events)?;
            let last_sync: Option<chrono::DateTime<chrono::Utc>> =
                storage::load(app.store.storage(), Scope::Local, KEY_MY_EVENTS_LAST_SYNC).await?;
            if let Some(last_sync) = last_sync {
                println!("Last synced: {}", last_sync.with_timezone(&Local).format("%b %-d, %Y %-I:%M %p"));
            }
        }
        Commands::ClearSearch => {
            app.store.clear_searched().await?;
            println!("🧹 Search results cleared");
        }
        Commands::ClearCache => {
            app.store.clear_cache().await?;
            println!("🧹 Cache cleared");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load()?;
    let app = App::new(config)?;

    if let Err(e) = run(&app, cli.command).await {
        error!("Command failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}
