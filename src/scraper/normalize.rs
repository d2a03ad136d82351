//! Text helpers shared by discovery and reconciliation.

use regex::Regex;
use std::sync::LazyLock;

static LISTING_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\.html").unwrap());

// First currency marker or digit ends the operation label ("Venta USD 120.000" -> "Venta").
static OPERATION_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)USD|U\$S|\$|\d").unwrap());

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

pub const ARS: &str = "ARS";
pub const USD: &str = "USD";

/// Listing id from a permalink: the digit run right before `.html`.
pub fn listing_id(url: &str) -> String {
    LISTING_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Drops everything that is not an ASCII digit: `"$ 150.000"` -> `"150000"`.
pub fn digits_only(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

/// First run of digits, or `""`: `"120 m² tot."` -> `"120"`.
pub fn first_digit_run(text: &str) -> String {
    DIGIT_RUN
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Maps a currency code from the embedded page state onto `ARS` / `USD`.
/// Unknown codes come back empty.
pub fn currency_code(raw: &str) -> &'static str {
    match raw.trim().to_ascii_uppercase().as_str() {
        "USD" | "U$S" => USD,
        "$" | "ARS" => ARS,
        _ => "",
    }
}

/// Currency shown in a rendered price. Explicit dollar markers win;
/// `$` or no marker at all means pesos.
pub fn price_currency(price_text: &str) -> &'static str {
    let upper = price_text.to_ascii_uppercase();
    if upper.contains("USD") || upper.contains("U$S") {
        USD
    } else {
        ARS
    }
}

/// Operation label without the trailing price: `"Venta USD 120.000"` -> `"Venta"`.
pub fn operation_label(raw: &str) -> String {
    let head = match OPERATION_END.find(raw) {
        Some(m) => &raw[..m.start()],
        None => raw,
    };
    head.trim().to_string()
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub calle: String,
    pub altura: String,
    pub barrio: Option<String>,
    pub localidad: Option<String>,
}

/// Splits a rendered address line such as `"Av. Rivadavia 1234, Caballito, CABA"`.
///
/// The street is the text of the first segment before its first digit and the
/// number is that digit run. Barrio and localidad are `None` when the line has
/// no second / third segment.
pub fn split_address(line: &str) -> AddressParts {
    let mut parts = line.split(',').map(str::trim);
    let first = parts.next().unwrap_or_default();

    let calle = match first.find(|c: char| c.is_ascii_digit()) {
        Some(idx) => &first[..idx],
        None => first,
    };

    AddressParts {
        calle: calle.trim().to_string(),
        altura: first_digit_run(first),
        barrio: parts.next().map(str::to_string),
        localidad: parts.next().map(str::to_string),
    }
}
