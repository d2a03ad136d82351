use crate::scraper::discover::DiscoverySettings;
use crate::scraper::extract::ExtractSettings;
use crate::scraper::pacing::JitteredPacer;
use crate::scraper::ScrapeSettings;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_AGENCY_URL: &str =
    "https://www.zonaprop.com.ar/inmobiliarias/century-21-billion_30409994-inmuebles.html";
pub const DEFAULT_SITE_ORIGIN: &str = "https://www.zonaprop.com.ar";

#[derive(Debug, Parser)]
#[command(name = "zonaprop_scraper", about = "Collects an agency's ZonaProp listings")]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the HTTP trigger (default).
    Serve,
    /// Run one scrape in the foreground.
    Scrape {
        /// Agency listing page; overrides --agency-url.
        #[arg(long)]
        agency: Option<String>,
        /// Write a spreadsheet here instead of the database.
        #[arg(long)]
        xlsx: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct Config {
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3000", global = true)]
    pub addr: SocketAddr,

    #[arg(long, env = "DATABASE_PATH", default_value = "zonaprop.sqlite3", global = true)]
    pub database: PathBuf,

    #[arg(long, env = "AGENCY_URL", default_value = DEFAULT_AGENCY_URL, global = true)]
    pub agency_url: String,

    #[arg(long, env = "SITE_ORIGIN", default_value = DEFAULT_SITE_ORIGIN, global = true)]
    pub site_origin: Url,

    /// Index pages visited at most.
    #[arg(long, env = "MAX_PAGES", default_value_t = 20, global = true)]
    pub max_pages: u32,

    #[arg(long, env = "PAGE_DELAY_MS", default_value_t = 2000, global = true)]
    pub page_delay_ms: u64,

    #[arg(long, env = "LISTING_DELAY_MS", default_value_t = 2000, global = true)]
    pub listing_delay_ms: u64,

    #[arg(long, env = "LISTING_JITTER_MS", default_value_t = 1000, global = true)]
    pub listing_jitter_ms: u64,

    #[arg(long, env = "LIST_TIMEOUT_SECS", default_value_t = 60, global = true)]
    pub list_timeout_secs: u64,

    #[arg(long, env = "DETAIL_TIMEOUT_SECS", default_value_t = 40, global = true)]
    pub detail_timeout_secs: u64,

    #[arg(long, env = "SELECTOR_TIMEOUT_SECS", default_value_t = 15, global = true)]
    pub selector_timeout_secs: u64,
}

impl Config {
    pub fn scrape_settings(&self) -> ScrapeSettings {
        ScrapeSettings {
            discovery: DiscoverySettings {
                site_origin: self.site_origin.clone(),
                max_pages: self.max_pages,
                page_timeout: Duration::from_secs(self.list_timeout_secs),
            },
            extract: ExtractSettings {
                navigation_timeout: Duration::from_secs(self.detail_timeout_secs),
                content_timeout: Duration::from_secs(self.selector_timeout_secs),
            },
            pacing: JitteredPacer {
                page_delay: Duration::from_millis(self.page_delay_ms),
                listing_delay: Duration::from_millis(self.listing_delay_ms),
                listing_jitter: Duration::from_millis(self.listing_jitter_ms),
            },
        }
    }
}
