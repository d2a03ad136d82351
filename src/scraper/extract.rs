use crate::domain::listing::ListingReference;
use crate::domain::property::PropertyRecord;
use crate::scraper::browser::Browser;
use crate::scraper::dom::{DomFragment, CONTENT_READY};
use crate::scraper::models::{StateFragment, INITIAL_STATE, NEXT_DATA};
use crate::scraper::pacing::{Pacer, Pause};
use crate::scraper::reconcile::reconcile;
use crate::scraper::ScraperError;
use crate::sink::RecordSink;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct ExtractSettings {
    pub navigation_timeout: Duration,
    /// How long to wait for the price / feature blocks before reading anyway.
    pub content_timeout: Duration,
}

/// Per-batch counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchTally {
    pub skipped_existing: usize,
    pub extracted: usize,
    pub failed: usize,
    pub saved: usize,
}

pub struct Extractor<'a> {
    settings: &'a ExtractSettings,
    pacer: &'a dyn Pacer,
}

impl<'a> Extractor<'a> {
    pub fn new(settings: &'a ExtractSettings, pacer: &'a dyn Pacer) -> Self {
        Self { settings, pacer }
    }

    /// Loads one listing and reconciles its embedded state with its markup.
    ///
    /// Only navigation (or an unusable page) fails; a missing price/feature
    /// block or missing embedded state just means less data.
    pub fn extract(
        &self,
        browser: &mut dyn Browser,
        listing: &ListingReference,
    ) -> Result<PropertyRecord, ScraperError> {
        info!(url = listing.url(), "scraping listing");
        browser.navigate(listing.url(), self.settings.navigation_timeout)?;

        if let Err(e) = browser.wait_for_selector(CONTENT_READY, self.settings.content_timeout) {
            debug!(url = listing.url(), error = %e, "listing content not ready, reading anyway");
        }

        let state = read_state(browser);
        if state.is_none() {
            debug!(url = listing.url(), "no embedded state, using markup only");
        }

        let dom = DomFragment::read(browser)?;
        Ok(reconcile(listing, state.as_ref(), &dom))
    }

    /// Extracts listings one after another into `sink`.
    ///
    /// Listings already in the sink are skipped without a visit. A failed
    /// listing or a rejected record is logged and the batch moves on.
    pub fn extract_batch(
        &self,
        browser: &mut dyn Browser,
        listings: &[ListingReference],
        sink: &mut dyn RecordSink,
    ) -> BatchTally {
        let mut tally = BatchTally::default();
        let total = listings.len();

        for (i, listing) in listings.iter().enumerate() {
            let n = i + 1;
            let id = listing.id();

            if id.is_empty() {
                warn!(url = listing.url(), "listing URL has no id");
            } else {
                match sink.contains(&id) {
                    Ok(true) => {
                        info!("[{n}/{total}] already stored: {id}");
                        tally.skipped_existing += 1;
                        continue;
                    }
                    Ok(false) => {}
                    Err(e) => warn!(%id, error = %e, "existence check failed, extracting anyway"),
                }
            }

            match self.extract(browser, listing) {
                Ok(record) => {
                    tally.extracted += 1;
                    info!(
                        "[{n}/{total}] {} {} - {}",
                        record.precio, record.moneda, record.operacion
                    );
                    match sink.accept(&record) {
                        Ok(()) => tally.saved += 1,
                        Err(e) => error!(id = %record.id, error = %e, "could not save listing"),
                    }
                }
                Err(e) => {
                    tally.failed += 1;
                    error!(url = listing.url(), error = %e, "listing failed");
                }
            }

            if n < total {
                self.pacer.pause(Pause::BetweenListings);
            }
        }

        tally
    }
}

fn read_global(browser: &dyn Browser, name: &str) -> Option<serde_json::Value> {
    browser.read_global(name).unwrap_or_else(|e| {
        warn!(global = name, error = %e, "unreadable page state");
        None
    })
}

fn read_state(browser: &dyn Browser) -> Option<StateFragment> {
    let initial = read_global(browser, INITIAL_STATE);
    let next = read_global(browser, NEXT_DATA);
    StateFragment::locate(initial.as_ref(), next.as_ref())
}
