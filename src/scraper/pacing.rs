use rand::Rng;
use std::time::Duration;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    BetweenPages,
    BetweenListings,
}

/// Delay policy between consecutive page visits.
pub trait Pacer {
    fn pause(&self, step: Pause);
}

/// Fixed delay between index pages; delay plus uniform jitter between listings.
#[derive(Debug, Clone)]
pub struct JitteredPacer {
    pub page_delay: Duration,
    pub listing_delay: Duration,
    pub listing_jitter: Duration,
}

impl Default for JitteredPacer {
    fn default() -> Self {
        Self {
            page_delay: Duration::from_secs(2),
            listing_delay: Duration::from_secs(2),
            listing_jitter: Duration::from_secs(1),
        }
    }
}

impl JitteredPacer {
    pub fn delay_for(&self, step: Pause) -> Duration {
        match step {
            Pause::BetweenPages => self.page_delay,
            Pause::BetweenListings => {
                let max_jitter = self.listing_jitter.as_millis() as u64;
                let jitter = if max_jitter == 0 {
                    0
                } else {
                    rand::thread_rng().gen_range(0..max_jitter)
                };
                self.listing_delay + Duration::from_millis(jitter)
            }
        }
    }
}

impl Pacer for JitteredPacer {
    fn pause(&self, step: Pause) {
        let delay = self.delay_for(step);
        trace!(?step, ?delay, "pausing");
        std::thread::sleep(delay);
    }
}

/// No delays at all.
pub struct NoPacing;

impl Pacer for NoPacing {
    fn pause(&self, _step: Pause) {}
}
