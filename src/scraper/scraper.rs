// scraper.rs
use crate::db::scrapes::{end_scrape_run, start_scrape_run, RunOutcome};
use crate::db::Database;
use crate::domain::listing::ListingSet;
use crate::scraper::browser::{Browser, HtmlBrowser, HttpFetcher, Session};
use crate::scraper::discover::{Discoverer, DiscoverySettings, StopReason};
use crate::scraper::extract::{ExtractSettings, Extractor};
use crate::scraper::pacing::{JitteredPacer, Pacer};
use crate::scraper::ScraperError;
use crate::sink::{RecordSink, SqliteSink};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub discovery: DiscoverySettings,
    pub extract: ExtractSettings,
    pub pacing: JitteredPacer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub pages_fetched: u32,
    pub stop: StopReason,
    pub discovered: usize,
    pub skipped_existing: usize,
    pub extracted: usize,
    pub failed: usize,
    pub saved: usize,
}

/// Discovers one agency's listings and extracts each into a sink, on a single
/// browser session.
pub struct AgencyScraper<'a> {
    discovery: &'a DiscoverySettings,
    extract: &'a ExtractSettings,
    pacer: &'a dyn Pacer,
}

impl<'a> AgencyScraper<'a> {
    pub fn new(
        discovery: &'a DiscoverySettings,
        extract: &'a ExtractSettings,
        pacer: &'a dyn Pacer,
    ) -> Self {
        Self {
            discovery,
            extract,
            pacer,
        }
    }

    /// Runs the whole pipeline for `agency_url`.
    ///
    /// Only failing to launch the browser is an error; per-page and
    /// per-listing failures are logged and counted. The session is closed
    /// before returning, whatever happened.
    pub fn run<B, L>(
        &self,
        launch: L,
        agency_url: &str,
        sink: &mut dyn RecordSink,
    ) -> Result<RunSummary, ScraperError>
    where
        B: Browser,
        L: FnOnce() -> Result<B, ScraperError>,
    {
        let mut session = Session::new(launch()?);

        info!(%agency_url, "collecting listing URLs");
        let discovery = Discoverer::new(self.discovery, self.pacer).discover(
            &mut *session,
            agency_url,
            ListingSet::new(),
        );
        info!(total = discovery.listings.len(), "listings found");

        let tally = Extractor::new(self.extract, self.pacer).extract_batch(
            &mut *session,
            discovery.listings.as_slice(),
            sink,
        );

        let mut saved = tally.saved;
        if let Err(e) = sink.finish() {
            error!(error = %e, "could not finalize output");
            saved = 0;
        }

        let summary = RunSummary {
            pages_fetched: discovery.pages_fetched,
            stop: discovery.stop,
            discovered: discovery.listings.len(),
            skipped_existing: tally.skipped_existing,
            extracted: tally.extracted,
            failed: tally.failed,
            saved,
        };
        info!(?summary, "run finished");
        Ok(summary)
    }
}

/// Clears the in-flight flag when the background run ends, even by panic.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn now_secs() -> i64 {
    Utc::now().timestamp()
}

/// Starts a background run into the database, bookkept in `scrape_runs`.
///
/// `running` must already be set by the caller; it is cleared when the thread ends.
pub fn spawn_agency_scrape(
    db: Database,
    settings: ScrapeSettings,
    agency_url: String,
    running: Arc<AtomicBool>,
) {
    std::thread::spawn(move || {
        let _guard = RunningGuard(running);

        let run_id = db
            .with_conn(|conn| start_scrape_run(conn, &agency_url, now_secs()))
            .unwrap_or_else(|e| {
                warn!(error = %e, "could not record scrape start");
                0
            });

        info!(%agency_url, run_id, "scraper thread started");

        let scraper = AgencyScraper::new(&settings.discovery, &settings.extract, &settings.pacing);
        let mut sink = SqliteSink::new(db.clone());

        let outcome = match scraper.run(HtmlBrowser::<HttpFetcher>::launch, &agency_url, &mut sink) {
            Ok(summary) => RunOutcome {
                pages_fetched: summary.pages_fetched,
                listings_discovered: summary.discovered,
                records_saved: summary.saved,
                error: None,
            },
            Err(e) => {
                error!(error = %e, "scrape failed");
                RunOutcome {
                    error: Some(e.to_string()),
                    ..Default::default()
                }
            }
        };

        if let Err(e) = db.with_conn(|conn| end_scrape_run(conn, run_id, now_secs(), &outcome)) {
            warn!(error = %e, "could not record scrape end");
        }
    });
}
