use crate::scraper::normalize::currency_code;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

// posting
//  ├── operationType
//  │    └── name
//  ├── price
//  │    ├── amount
//  │    ├── currency
//  │    └── expenses
//  ├── location
//  │    ├── address
//  │    │    ├── street
//  │    │    ├── number
//  │    │    ├── neighborhood
//  │    │    └── city
//  │    └── city
//  │         └── name
//  └── mainFeatures
//       ├── totalArea / coveredArea
//       ├── rooms / bedrooms / bathrooms / parkingLots
//       └── age           (each { value })

/// Global the listing page assigns its server-rendered state to.
pub const INITIAL_STATE: &str = "__INITIAL_STATE__";
/// Next.js payload; the listing state lives under `props.pageProps`.
pub const NEXT_DATA: &str = "__NEXT_DATA__";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateFragment {
    #[serde(deserialize_with = "lenient")]
    pub operation_type: Option<Named>,
    #[serde(deserialize_with = "lenient")]
    pub price: Option<Price>,
    #[serde(deserialize_with = "lenient")]
    pub location: Option<Location>,
    #[serde(deserialize_with = "lenient")]
    pub main_features: Option<MainFeatures>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Named {
    pub name: Option<Loose>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Price {
    pub amount: Option<Loose>,
    pub currency: Option<Loose>,
    pub expenses: Option<Loose>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Location {
    #[serde(deserialize_with = "lenient")]
    pub address: Option<Address>,
    #[serde(deserialize_with = "lenient")]
    pub city: Option<Named>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Address {
    pub street: Option<Loose>,
    pub number: Option<Loose>,
    pub neighborhood: Option<Loose>,
    pub city: Option<Loose>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MainFeatures {
    #[serde(deserialize_with = "lenient")]
    pub total_area: Option<Feature>,
    #[serde(deserialize_with = "lenient")]
    pub covered_area: Option<Feature>,
    #[serde(deserialize_with = "lenient")]
    pub rooms: Option<Feature>,
    #[serde(deserialize_with = "lenient")]
    pub bedrooms: Option<Feature>,
    #[serde(deserialize_with = "lenient")]
    pub bathrooms: Option<Feature>,
    #[serde(deserialize_with = "lenient")]
    pub parking_lots: Option<Feature>,
    #[serde(deserialize_with = "lenient")]
    pub age: Option<Feature>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Feature {
    pub value: Option<Loose>,
}

// A branch of the wrong JSON type reads as absent instead of failing the whole posting.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// A leaf the site fills inconsistently: a string, a number, or an object with a `name`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Loose {
    Text(String),
    Number(serde_json::Number),
    Named { name: String },
    Other(Value),
}

impl Loose {
    pub fn text(&self) -> String {
        match self {
            Loose::Text(s) => s.trim().to_string(),
            Loose::Named { name } => name.trim().to_string(),
            Loose::Number(n) => number_text(n),
            Loose::Other(_) => String::new(),
        }
    }
}

fn number_text(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => String::new(),
    }
}

fn text(value: Option<&Loose>) -> String {
    value.map(Loose::text).unwrap_or_default()
}

fn feature(value: Option<&Feature>) -> String {
    text(value.and_then(|f| f.value.as_ref()))
}

/// The embedded state flattened to strings. Empty means "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateFields {
    pub operacion: String,
    pub precio: String,
    /// Already normalized to `ARS` / `USD` / `""`.
    pub moneda: String,
    pub expensas: String,
    pub calle: String,
    pub altura: String,
    pub barrio: String,
    pub localidad: String,
    pub m2_total: String,
    pub m2_cubierta: String,
    pub ambientes: String,
    pub dormitorios: String,
    pub banios: String,
    pub cocheras: String,
    pub antiguedad: String,
}

impl StateFragment {
    /// Picks the listing out of whichever page global is present.
    ///
    /// `initial_state` wins over `next_data.props.pageProps`; inside it the first
    /// non-empty of `posting.posting`, `postingData`, `post.posting`, `posting`
    /// and `project` is the listing. A listing whose shape does not deserialize
    /// is reported and treated as absent.
    pub fn locate(initial_state: Option<&Value>, next_data: Option<&Value>) -> Option<Self> {
        let state = initial_state
            .filter(|v| truthy(v))
            .or_else(|| next_data.and_then(|v| v.pointer("/props/pageProps")))
            .filter(|v| truthy(v))?;

        let posting = ["/posting/posting", "/postingData", "/post/posting", "/posting", "/project"]
            .iter()
            .filter_map(|path| state.pointer(path))
            .find(|v| truthy(v))?;

        match serde_json::from_value::<StateFragment>(posting.clone()) {
            Ok(fragment) => Some(fragment),
            Err(e) => {
                warn!(error = %e, "embedded listing state has an unexpected shape");
                None
            }
        }
    }

    pub fn fields(&self) -> StateFields {
        let price = self.price.as_ref();
        let location = self.location.as_ref();
        let address = location.and_then(|l| l.address.as_ref());
        let features = self.main_features.as_ref();

        let mut localidad = text(address.and_then(|a| a.city.as_ref()));
        if localidad.is_empty() {
            localidad = text(location.and_then(|l| l.city.as_ref()).and_then(|c| c.name.as_ref()));
        }

        StateFields {
            operacion: text(self.operation_type.as_ref().and_then(|o| o.name.as_ref())),
            precio: text(price.and_then(|p| p.amount.as_ref())),
            moneda: currency_code(&text(price.and_then(|p| p.currency.as_ref()))).to_string(),
            expensas: text(price.and_then(|p| p.expenses.as_ref())),
            calle: text(address.and_then(|a| a.street.as_ref())),
            altura: text(address.and_then(|a| a.number.as_ref())),
            barrio: text(address.and_then(|a| a.neighborhood.as_ref())),
            localidad,
            m2_total: feature(features.and_then(|f| f.total_area.as_ref())),
            m2_cubierta: feature(features.and_then(|f| f.covered_area.as_ref())),
            ambientes: feature(features.and_then(|f| f.rooms.as_ref())),
            dormitorios: feature(features.and_then(|f| f.bedrooms.as_ref())),
            banios: feature(features.and_then(|f| f.bathrooms.as_ref())),
            cocheras: feature(features.and_then(|f| f.parking_lots.as_ref())),
            antiguedad: feature(features.and_then(|f| f.age.as_ref())),
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}
