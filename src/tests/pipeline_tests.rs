// src/tests/pipeline_tests.rs

use super::fixtures::*;
use crate::domain::listing::{ListingReference, ListingSet};
use crate::scraper::browser::{HtmlBrowser, Session};
use crate::scraper::discover::{Discoverer, DiscoverySettings, StopReason};
use crate::scraper::extract::{ExtractSettings, Extractor};
use crate::scraper::pacing::{NoPacing, Pause};
use crate::scraper::{AgencyScraper, ScraperError};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use url::Url;

fn discovery_settings(max_pages: u32) -> DiscoverySettings {
    DiscoverySettings {
        site_origin: Url::parse("https://www.zonaprop.com.ar").unwrap(),
        max_pages,
        page_timeout: Duration::from_secs(1),
    }
}

fn extract_settings() -> ExtractSettings {
    ExtractSettings {
        navigation_timeout: Duration::from_secs(1),
        content_timeout: Duration::from_millis(10),
    }
}

fn relative(url: &str) -> String {
    url.trim_start_matches("https://www.zonaprop.com.ar").to_string()
}

const STATE: &str = r#"{
    "operationType": {"name": "Venta"},
    "price": {"amount": 118000, "currency": "ARS", "expenses": null},
    "location": {"address": {"street": "Gurruchaga", "number": 800, "neighborhood": "Palermo", "city": "Capital Federal"}},
    "mainFeatures": {"rooms": {"value": 5}, "age": {"value": "10"}}
}"#;

// ── Discovery ──────────────────────────────────────────────────────────

#[test]
fn rediscovering_a_page_does_not_grow_the_set() {
    let pages = PageMap::new().page(&agency_page(1), index_html(&[relative(&listing(1)), listing(2)]));
    let mut browser = HtmlBrowser::new(pages);
    let settings = discovery_settings(1);
    let discoverer = Discoverer::new(&settings, &NoPacing);

    let first = discoverer.discover(&mut browser, AGENCY, ListingSet::new());
    assert_eq!(first.listings.len(), 2);

    let second = discoverer.discover(&mut browser, AGENCY, first.listings);
    assert_eq!(second.listings.len(), 2);
    assert_eq!(second.stop, StopReason::Exhausted { page: 1 });
}

#[test]
fn stops_at_first_page_without_new_links() {
    let pages = PageMap::new()
        .page(&agency_page(1), index_html(&[listing(1), listing(2)]))
        .page(&agency_page(2), index_html(&[listing(3), listing(1)]))
        .page(&agency_page(3), index_html(&[listing(3), listing(2)]))
        .page(&agency_page(4), index_html(&[listing(4)]));
    let log = pages.log();
    let mut browser = HtmlBrowser::new(pages);
    let settings = discovery_settings(20);
    let pacer = RecordingPacer::default();

    let found = Discoverer::new(&settings, &pacer).discover(&mut browser, AGENCY, ListingSet::new());

    assert_eq!(found.stop, StopReason::Exhausted { page: 3 });
    assert_eq!(found.pages_fetched, 3);
    assert_eq!(found.listings.len(), 3);
    assert!(!log.borrow().contains(&agency_page(4)));
    assert_eq!(*pacer.pauses.borrow(), vec![Pause::BetweenPages; 2]);

    let urls: Vec<&str> = found.listings.iter().map(ListingReference::url).collect();
    assert_eq!(urls, [listing(1), listing(2), listing(3)]);
}

#[test]
fn navigation_failure_keeps_earlier_pages() {
    let pages = PageMap::new()
        .page(&agency_page(1), index_html(&[listing(1)]))
        .failing(&agency_page(2), "operation timed out");
    let mut browser = HtmlBrowser::new(pages);
    let settings = discovery_settings(20);

    let found = Discoverer::new(&settings, &NoPacing).discover(&mut browser, AGENCY, ListingSet::new());

    assert_eq!(found.stop, StopReason::NavigationFailed { page: 2 });
    assert_eq!(found.pages_fetched, 1);
    assert_eq!(found.listings.len(), 1);
}

#[test]
fn page_cap_bounds_discovery() {
    let pages = PageMap::new()
        .page(&agency_page(1), index_html(&[listing(1)]))
        .page(&agency_page(2), index_html(&[listing(2)]))
        .page(&agency_page(3), index_html(&[listing(3)]));
    let log = pages.log();
    let mut browser = HtmlBrowser::new(pages);
    let settings = discovery_settings(2);

    let found = Discoverer::new(&settings, &NoPacing).discover(&mut browser, AGENCY, ListingSet::new());

    assert_eq!(found.stop, StopReason::PageLimit);
    assert_eq!(found.listings.len(), 2);
    assert_eq!(log.borrow().len(), 2);
}

// ── Extraction ─────────────────────────────────────────────────────────

#[test]
fn markup_only_listing_is_fully_populated() {
    let url = listing(7);
    let mut browser = HtmlBrowser::new(PageMap::new().page(&url, listing_html(None)));
    let settings = extract_settings();

    let record = Extractor::new(&settings, &NoPacing)
        .extract(&mut browser, &ListingReference::new(url.as_str()))
        .unwrap();

    assert_eq!(record.id, "49870007");
    assert_eq!(record.url, url);
    assert_eq!(record.operacion, "Venta");
    assert_eq!(record.precio, "120000");
    assert_eq!(record.moneda, "USD");
    assert_eq!(record.expensas, "45000");
    assert_eq!(record.calle, "Av. Rivadavia");
    assert_eq!(record.altura, "1234");
    assert_eq!(record.barrio, "Caballito");
    assert_eq!(record.localidad, "CABA");
    assert_eq!(record.m2_total, "120");
    assert_eq!(record.m2_cubierta, "95");
    assert_eq!(record.ambientes, "4");
    assert_eq!(record.dormitorios, "3");
    assert_eq!(record.banios, "2");
    assert_eq!(record.cocheras, "1");
    assert_eq!(record.antiguedad, "A estrenar");
}

#[test]
fn embedded_state_wins_but_rendered_dollars_decide_currency() {
    let url = listing(8);
    let mut browser = HtmlBrowser::new(PageMap::new().page(&url, listing_html(Some(STATE))));
    let settings = extract_settings();

    let record = Extractor::new(&settings, &NoPacing)
        .extract(&mut browser, &ListingReference::new(url.as_str()))
        .unwrap();

    assert_eq!(record.precio, "118000");
    assert_eq!(record.moneda, "USD");
    assert_eq!(record.expensas, "45000");
    assert_eq!(record.calle, "Gurruchaga");
    assert_eq!(record.altura, "800");
    assert_eq!(record.barrio, "Palermo");
    assert_eq!(record.localidad, "Capital Federal");
    assert_eq!(record.ambientes, "5");
    assert_eq!(record.dormitorios, "3");
    assert_eq!(record.antiguedad, "10");
}

#[test]
fn page_without_content_blocks_still_yields_a_record() {
    let url = listing(9);
    let mut browser = HtmlBrowser::new(PageMap::new().page(&url, "<html><body><p>Aviso finalizado</p></body></html>"));
    let settings = extract_settings();

    let record = Extractor::new(&settings, &NoPacing)
        .extract(&mut browser, &ListingReference::new(url.as_str()))
        .unwrap();

    assert_eq!(record.id, "49870009");
    assert_eq!(record.precio, "");
    assert_eq!(record.moneda, "ARS");
}

#[test]
fn failed_listing_does_not_stop_the_batch() {
    let pages = PageMap::new()
        .page(&listing(1), listing_html(None))
        .failing(&listing(2), "net::ERR_CONNECTION_RESET")
        .page(&listing(3), listing_html(Some(STATE)));
    let log = pages.log();
    let mut browser = HtmlBrowser::new(pages);
    let settings = extract_settings();
    let pacer = RecordingPacer::default();
    let mut sink = MemorySink::default();

    let batch: Vec<ListingReference> = (1..=3).map(|n| ListingReference::new(listing(n))).collect();
    let tally = Extractor::new(&settings, &pacer).extract_batch(&mut browser, &batch, &mut sink);

    assert_eq!(tally.extracted, 2);
    assert_eq!(tally.failed, 1);
    assert_eq!(tally.saved, 2);
    assert_eq!(log.borrow().len(), 3);
    let ids: Vec<&str> = sink.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["49870001", "49870003"]);
    assert_eq!(*pacer.pauses.borrow(), vec![Pause::BetweenListings; 2]);
}

#[test]
fn stored_listings_are_not_visited() {
    let pages = PageMap::new()
        .page(&listing(1), listing_html(None))
        .page(&listing(2), listing_html(None));
    let log = pages.log();
    let mut browser = HtmlBrowser::new(pages);
    let settings = extract_settings();
    let mut sink = MemorySink::default();
    sink.existing.insert("49870001".into());

    let batch: Vec<ListingReference> = (1..=2).map(|n| ListingReference::new(listing(n))).collect();
    let tally = Extractor::new(&settings, &NoPacing).extract_batch(&mut browser, &batch, &mut sink);

    assert_eq!(tally.skipped_existing, 1);
    assert_eq!(tally.extracted, 1);
    assert_eq!(*log.borrow(), vec![listing(2)]);
}

#[test]
fn rejected_records_are_counted_not_fatal() {
    let pages = PageMap::new()
        .page(&listing(1), listing_html(None))
        .page(&listing(2), listing_html(None));
    let mut browser = HtmlBrowser::new(pages);
    let settings = extract_settings();
    let mut sink = MemorySink {
        reject: true,
        ..Default::default()
    };

    let batch: Vec<ListingReference> = (1..=2).map(|n| ListingReference::new(listing(n))).collect();
    let tally = Extractor::new(&settings, &NoPacing).extract_batch(&mut browser, &batch, &mut sink);

    assert_eq!(tally.extracted, 2);
    assert_eq!(tally.saved, 0);
    assert!(sink.records.is_empty());
}

// ── Whole run ──────────────────────────────────────────────────────────

#[test]
fn full_run_discovers_extracts_and_closes_the_session() {
    let pages = PageMap::new()
        .page(&agency_page(1), index_html(&[relative(&listing(1)), relative(&listing(2))]))
        .page(&agency_page(2), index_html(&[relative(&listing(2))]))
        .page(&listing(1), listing_html(Some(STATE)))
        .failing(&listing(2), "timeout");
    let closed = Rc::new(Cell::new(false));
    let browser = Tracked {
        inner: HtmlBrowser::new(pages),
        closed: closed.clone(),
    };

    let discovery = discovery_settings(20);
    let extract = extract_settings();
    let mut sink = MemorySink::default();

    let summary = AgencyScraper::new(&discovery, &extract, &NoPacing)
        .run(move || Ok(browser), AGENCY, &mut sink)
        .unwrap();

    assert_eq!(summary.pages_fetched, 2);
    assert_eq!(summary.stop, StopReason::Exhausted { page: 2 });
    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.extracted, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.saved, 1);
    assert!(sink.finished);
    assert!(closed.get());
}

#[test]
fn launch_failure_is_the_only_fatal_error() {
    let discovery = discovery_settings(20);
    let extract = extract_settings();
    let mut sink = MemorySink::default();

    let result = AgencyScraper::new(&discovery, &extract, &NoPacing).run(
        || -> Result<HtmlBrowser<PageMap>, ScraperError> {
            Err(ScraperError::Session("no browser".into()))
        },
        AGENCY,
        &mut sink,
    );

    assert!(matches!(result, Err(ScraperError::Session(_))));
    assert!(!sink.finished);
}

#[test]
fn session_closes_on_drop() {
    let closed = Rc::new(Cell::new(false));
    {
        let _session = Session::new(Tracked {
            inner: HtmlBrowser::new(PageMap::new()),
            closed: closed.clone(),
        });
    }
    assert!(closed.get());
}
