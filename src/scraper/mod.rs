pub mod browser;
pub mod discover;
pub mod dom;
pub mod extract;
pub mod models;
pub mod normalize;
pub mod pacing;
pub mod reconcile;
mod scraper;
mod scraper_error;

pub use scraper::{spawn_agency_scrape, AgencyScraper, RunSummary, ScrapeSettings};
pub use scraper_error::ScraperError;
