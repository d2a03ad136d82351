use crate::domain::listing::{ListingReference, ListingSet};
use crate::scraper::browser::Browser;
use crate::scraper::pacing::{Pacer, Pause};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Anchors on an agency index page that may point at a listing.
pub const LISTING_LINKS: &str = "a[data-to-posting], a[href*='/propiedades/']";
const LISTING_MARKER: &str = "/propiedades/";
const LISTING_SUFFIX: &str = ".html";
const AGENCY_MARKER: &str = "inmobiliarias";

#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    pub site_origin: Url,
    /// Hard cap on index pages visited.
    pub max_pages: u32,
    pub page_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// This page contributed no new listings.
    Exhausted { page: u32 },
    PageLimit,
    /// Navigating to this page failed; earlier results are kept.
    NavigationFailed { page: u32 },
}

#[derive(Debug)]
pub struct Discovery {
    pub listings: ListingSet,
    pub pages_fetched: u32,
    pub stop: StopReason,
}

/// Agency index page `page` (1-based): `…-inmuebles.html`, `…-inmuebles-pagina-2.html`, …
pub fn page_url(agency_url: &str, page: u32) -> String {
    if page <= 1 {
        agency_url.to_string()
    } else {
        agency_url.replacen(LISTING_SUFFIX, &format!("-pagina-{page}{LISTING_SUFFIX}"), 1)
    }
}

/// Absolute, query-free listing URL for an index-page href, or `None` when the
/// href is not a listing permalink.
pub fn listing_url(origin: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.contains(AGENCY_MARKER) || !href.contains(LISTING_MARKER) {
        return None;
    }

    let mut url = origin.join(href).ok()?;
    url.set_query(None);
    url.set_fragment(None);

    url.path().ends_with(LISTING_SUFFIX).then(|| url.to_string())
}

pub struct Discoverer<'a> {
    settings: &'a DiscoverySettings,
    pacer: &'a dyn Pacer,
}

impl<'a> Discoverer<'a> {
    pub fn new(settings: &'a DiscoverySettings, pacer: &'a dyn Pacer) -> Self {
        Self { settings, pacer }
    }

    /// Walks the agency's index pages, adding listings to `found`.
    ///
    /// Stops at the first page that adds nothing new, at the page cap, or at the
    /// first page that fails to load. Whatever was accumulated is returned.
    pub fn discover(
        &self,
        browser: &mut dyn Browser,
        agency_url: &str,
        mut found: ListingSet,
    ) -> Discovery {
        let mut pages_fetched = 0;

        for page in 1..=self.settings.max_pages {
            let url = page_url(agency_url, page);
            info!(page, %url, "fetching agency page");

            let added = match self.collect_page(browser, &url, &mut found) {
                Ok(added) => added,
                Err(e) => {
                    warn!(page, error = %e, "agency page failed, stopping discovery");
                    return Discovery {
                        listings: found,
                        pages_fetched,
                        stop: StopReason::NavigationFailed { page },
                    };
                }
            };
            pages_fetched += 1;

            info!(page, new = added, total = found.len(), "agency page parsed");

            if added == 0 {
                info!(page, "no new listings, discovery finished");
                return Discovery {
                    listings: found,
                    pages_fetched,
                    stop: StopReason::Exhausted { page },
                };
            }

            if page < self.settings.max_pages {
                self.pacer.pause(Pause::BetweenPages);
            }
        }

        info!(max_pages = self.settings.max_pages, "page limit reached");
        Discovery {
            listings: found,
            pages_fetched,
            stop: StopReason::PageLimit,
        }
    }

    fn collect_page(
        &self,
        browser: &mut dyn Browser,
        url: &str,
        found: &mut ListingSet,
    ) -> Result<usize, crate::scraper::ScraperError> {
        browser.navigate(url, self.settings.page_timeout)?;

        let added = browser
            .attribute_all(LISTING_LINKS, "href")?
            .iter()
            .filter_map(|href| listing_url(&self.settings.site_origin, href))
            .filter(|url| found.insert(ListingReference::new(url.as_str())))
            .count();

        Ok(added)
    }
}
