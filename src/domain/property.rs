// src/domain/property.rs

use serde::Serialize;

/// Spreadsheet / table column order for [`PropertyRecord`].
pub const COLUMNS: [&str; 17] = [
    "id",
    "url",
    "operacion",
    "precio",
    "moneda",
    "expensas",
    "calle",
    "altura",
    "barrio",
    "localidad",
    "m2T",
    "m2C",
    "ambientes",
    "dormitorios",
    "banios",
    "cocheras",
    "antiguedad",
];

/// One listing, normalized from the page's embedded state and its rendered markup.
///
/// Every field is a plain string. Anything neither source resolved is `""`,
/// `precio`/`expensas` hold digits only and `moneda` is `"ARS"`, `"USD"` or `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropertyRecord {
    pub id: String,
    pub url: String,
    pub operacion: String,
    pub precio: String,
    pub moneda: String,
    pub expensas: String,
    pub calle: String,
    pub altura: String,
    pub barrio: String,
    pub localidad: String,
    #[serde(rename = "m2T")]
    pub m2_total: String,
    #[serde(rename = "m2C")]
    pub m2_cubierta: String,
    pub ambientes: String,
    pub dormitorios: String,
    pub banios: String,
    pub cocheras: String,
    pub antiguedad: String,
}

impl PropertyRecord {
    /// Field values in [`COLUMNS`] order.
    pub fn values(&self) -> [&str; 17] {
        [
            &self.id,
            &self.url,
            &self.operacion,
            &self.precio,
            &self.moneda,
            &self.expensas,
            &self.calle,
            &self.altura,
            &self.barrio,
            &self.localidad,
            &self.m2_total,
            &self.m2_cubierta,
            &self.ambientes,
            &self.dormitorios,
            &self.banios,
            &self.cocheras,
            &self.antiguedad,
        ]
    }
}
