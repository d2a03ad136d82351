use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    /// Page failed to load: network error, timeout or non-success status.
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("Selector `{selector}` did not appear within {timeout:?}")]
    SelectorTimeout { selector: String, timeout: Duration },
    #[error("Invalid selector `{0}`")]
    Selector(String),
    #[error("JSON parse error: {0}")]
    JsonParse(String),
    #[error("No page loaded")]
    NoPage,
    #[error("Browser session error: {0}")]
    Session(String),
}
