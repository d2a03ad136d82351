use crate::scraper::ScraperError;
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::ops::{Deref, DerefMut};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// The page-automation surface the scraper needs.
///
/// One implementation drives one page at a time: every query reads the page
/// loaded by the last successful [`Browser::navigate`].
pub trait Browser {
    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), ScraperError>;

    /// Ok once an element matching `selector` is present, `SelectorTimeout` otherwise.
    fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<(), ScraperError>;

    /// Structured value of a global in the page's script context, if it is set.
    fn read_global(&self, name: &str) -> Result<Option<Value>, ScraperError>;

    /// `attr` of every element matching `selector`; elements without it are skipped.
    fn attribute_all(&self, selector: &str, attr: &str) -> Result<Vec<String>, ScraperError>;

    /// Rendered text of the first element matching `selector`.
    fn inner_text(&self, selector: &str) -> Result<Option<String>, ScraperError>;

    /// Rendered text of the closest `ancestor` of the first element matching `selector`.
    fn closest_text(&self, selector: &str, ancestor: &str)
        -> Result<Option<String>, ScraperError>;

    fn close(&mut self) {}
}

/// Owns a browser for the length of a run and closes it however the run ends.
pub struct Session<B: Browser> {
    browser: B,
}

impl<B: Browser> Session<B> {
    pub fn new(browser: B) -> Self {
        Self { browser }
    }
}

impl<B: Browser> Deref for Session<B> {
    type Target = B;

    fn deref(&self) -> &B {
        &self.browser
    }
}

impl<B: Browser> DerefMut for Session<B> {
    fn deref_mut(&mut self) -> &mut B {
        &mut self.browser
    }
}

impl<B: Browser> Drop for Session<B> {
    fn drop(&mut self) {
        debug!("closing browser session");
        self.browser.close();
    }
}

/// Source of raw page HTML.
pub trait Fetch {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<String, ScraperError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ScraperError::Session(e.to_string()))?;

        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<String, ScraperError> {
        let navigation = |reason: String| ScraperError::Navigation {
            url: url.to_string(),
            reason,
        };

        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(|e| navigation(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(navigation(format!("HTTP {status}")));
        }

        resp.text().map_err(|e| navigation(e.to_string()))
    }
}

/// Browser over server-rendered HTML: pages are fetched whole and queried
/// with CSS selectors; script globals are read from inline `<script>` tags.
pub struct HtmlBrowser<F: Fetch> {
    fetcher: F,
    page: Option<Html>,
}

impl<F: Fetch> HtmlBrowser<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher, page: None }
    }

    fn page(&self) -> Result<&Html, ScraperError> {
        self.page.as_ref().ok_or(ScraperError::NoPage)
    }
}

impl HtmlBrowser<HttpFetcher> {
    pub fn launch() -> Result<Self, ScraperError> {
        Ok(Self::new(HttpFetcher::new()?))
    }
}

fn selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::Selector(format!("{css}: {e:?}")))
}

/// Text nodes joined and whitespace-collapsed, close to what `innerText` yields.
fn rendered_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// JSON assigned as `window.NAME = {...}` somewhere in a script body.
fn assigned_json(script: &str, name: &str) -> Result<Option<Value>, ScraperError> {
    let needle = format!("window.{name}");
    // Reads and comparisons of the global may come before the assignment.
    let assignment = script.match_indices(&needle).find_map(|(start, _)| {
        script[start + needle.len()..]
            .trim_start()
            .strip_prefix('=')
            .filter(|rest| !rest.starts_with('='))
    });
    let Some(rest) = assignment else {
        return Ok(None);
    };

    // Only the first value matters; whatever follows (`;`, more code) is ignored.
    let mut values = serde_json::Deserializer::from_str(rest.trim_start()).into_iter::<Value>();
    match values.next() {
        Some(Ok(value)) => Ok(Some(value)),
        Some(Err(e)) => Err(ScraperError::JsonParse(format!("{name}: {e}"))),
        None => Ok(None),
    }
}

impl<F: Fetch> Browser for HtmlBrowser<F> {
    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), ScraperError> {
        self.page = None;
        let html = self.fetcher.fetch(url, timeout)?;
        self.page = Some(Html::parse_document(&html));
        Ok(())
    }

    fn wait_for_selector(&mut self, css: &str, timeout: Duration) -> Result<(), ScraperError> {
        let sel = selector(css)?;
        // The document is complete once fetched; nothing more will render.
        if self.page()?.select(&sel).next().is_some() {
            Ok(())
        } else {
            Err(ScraperError::SelectorTimeout {
                selector: css.to_string(),
                timeout,
            })
        }
    }

    fn read_global(&self, name: &str) -> Result<Option<Value>, ScraperError> {
        let scripts = selector("script")?;

        for script in self.page()?.select(&scripts) {
            let body: String = script.text().collect();

            // Next.js ships its payload as <script id="__NEXT_DATA__" type="application/json">.
            if script.value().id() == Some(name) {
                return serde_json::from_str(body.trim())
                    .map(Some)
                    .map_err(|e| ScraperError::JsonParse(format!("{name}: {e}")));
            }

            if let Some(value) = assigned_json(&body, name)? {
                return Ok(Some(value));
            }
        }

        Ok(None)
    }

    fn attribute_all(&self, css: &str, attr: &str) -> Result<Vec<String>, ScraperError> {
        let sel = selector(css)?;
        Ok(self
            .page()?
            .select(&sel)
            .filter_map(|el| el.value().attr(attr))
            .map(str::to_string)
            .collect())
    }

    fn inner_text(&self, css: &str) -> Result<Option<String>, ScraperError> {
        let sel = selector(css)?;
        Ok(self.page()?.select(&sel).next().map(rendered_text))
    }

    fn closest_text(&self, css: &str, ancestor: &str) -> Result<Option<String>, ScraperError> {
        let sel = selector(css)?;
        let ancestor_sel = selector(ancestor)?;

        let Some(el) = self.page()?.select(&sel).next() else {
            return Ok(None);
        };

        let closest = std::iter::once(el)
            .chain(el.ancestors().filter_map(ElementRef::wrap))
            .find(|candidate| ancestor_sel.matches(candidate));

        Ok(closest.map(rendered_text))
    }

    fn close(&mut self) {
        self.page = None;
    }
}
