use crate::scraper::browser::Browser;
use crate::scraper::ScraperError;

pub const PRICE: &str = ".price-value";
pub const PRICE_OPERATION: &str = ".price-value span";
pub const EXPENSES: &str = ".price-expenses";
pub const ADDRESS: &str = ".section-location-property";
pub const ADDRESS_TITLE: &str = ".title-address";
pub const FEATURE_BLOCK: &str = ".icon-feature";

/// Either indicator means the listing body has rendered.
pub const CONTENT_READY: &str = ".price-value, .icon-feature";

/// Raw text read from the rendered listing. Nothing here is normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomFragment {
    /// Whole price block, e.g. `"Venta USD 120.000"`; `None` when the page has none.
    pub price_text: Option<String>,
    pub operation_text: String,
    pub expenses_text: String,
    pub address_line: String,
    pub m2_total: String,
    pub m2_cubierta: String,
    pub ambientes: String,
    pub dormitorios: String,
    pub banios: String,
    pub cocheras: String,
    pub antiguedad: String,
}

impl DomFragment {
    pub fn read(browser: &dyn Browser) -> Result<Self, ScraperError> {
        let text = |css: &str| -> Result<String, ScraperError> {
            Ok(browser.inner_text(css)?.unwrap_or_default())
        };
        let feature = |icon: &str| -> Result<String, ScraperError> {
            let css = format!("{FEATURE_BLOCK} .{icon}");
            Ok(browser.closest_text(&css, FEATURE_BLOCK)?.unwrap_or_default())
        };

        let mut address_line = text(ADDRESS)?;
        if address_line.is_empty() {
            address_line = text(ADDRESS_TITLE)?;
        }

        Ok(Self {
            price_text: browser.inner_text(PRICE)?,
            operation_text: text(PRICE_OPERATION)?,
            expenses_text: text(EXPENSES)?,
            address_line,
            m2_total: feature("icon-stotal")?,
            m2_cubierta: feature("icon-scubierta")?,
            ambientes: feature("icon-ambiente")?,
            dormitorios: feature("icon-dormitorio")?,
            banios: feature("icon-bano")?,
            cocheras: feature("icon-cochera")?,
            antiguedad: feature("icon-antiguedad")?,
        })
    }
}
