use crate::scraper::normalize::listing_id;
use std::collections::HashSet;

/// A listing permalink found on an agency index page.
/// Identity is the normalized absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingReference {
    url: String,
}

impl ListingReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Numeric listing id taken from the `…-12345678.html` suffix; empty if absent.
    pub fn id(&self) -> String {
        listing_id(&self.url)
    }
}

/// Insertion-ordered set of discovered listings keyed by URL.
///
/// Re-inserting a known URL is a no-op, so feeding the same index page
/// through discovery twice leaves the set unchanged.
#[derive(Debug, Default, Clone)]
pub struct ListingSet {
    order: Vec<ListingReference>,
    seen: HashSet<String>,
}

impl ListingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the URL was not already present.
    pub fn insert(&mut self, listing: ListingReference) -> bool {
        if !self.seen.insert(listing.url.clone()) {
            return false;
        }
        self.order.push(listing);
        true
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn as_slice(&self) -> &[ListingReference] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &ListingReference> {
        self.order.iter()
    }
}
