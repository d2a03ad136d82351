use crate::domain::listing::ListingReference;
use crate::domain::property::PropertyRecord;
use crate::scraper::dom::DomFragment;
use crate::scraper::models::{StateFields, StateFragment};
use crate::scraper::normalize::{
    digits_only, first_digit_run, operation_label, price_currency, split_address, ARS,
};

fn or_else(preferred: String, fallback: &str) -> String {
    if preferred.is_empty() {
        fallback.trim().to_string()
    } else {
        preferred
    }
}

/// Merges the embedded state (preferred) with the rendered markup into one record.
///
/// The markup fills whatever the state leaves empty, and also decides the
/// currency whenever the state reports none or pesos: the state tends to
/// default to `ARS` even for prices shown in dollars.
pub fn reconcile(
    listing: &ListingReference,
    state: Option<&StateFragment>,
    dom: &DomFragment,
) -> PropertyRecord {
    let a = state.map(StateFragment::fields).unwrap_or_default();
    let StateFields {
        operacion,
        precio,
        moneda,
        expensas,
        mut calle,
        mut altura,
        mut barrio,
        mut localidad,
        m2_total,
        m2_cubierta,
        ambientes,
        dormitorios,
        banios,
        cocheras,
        antiguedad,
    } = a;

    // Pesos unless the rendered price says otherwise, also when there is no price block.
    let shown_currency = dom.price_text.as_deref().map_or(ARS, price_currency);
    let moneda = if moneda.is_empty() || moneda == ARS {
        shown_currency.to_string()
    } else {
        moneda
    };

    if calle.is_empty() && !dom.address_line.is_empty() {
        let parts = split_address(&dom.address_line);
        calle = parts.calle;
        altura = parts.altura;
        if let Some(b) = parts.barrio {
            barrio = b;
        }
        if let Some(l) = parts.localidad {
            localidad = l;
        }
    }

    let price_text = dom.price_text.as_deref().unwrap_or_default();

    PropertyRecord {
        id: listing.id(),
        url: listing.url().to_string(),
        operacion: operation_label(&or_else(operacion, &dom.operation_text)),
        precio: digits_only(&or_else(precio, price_text)),
        moneda,
        expensas: digits_only(&or_else(expensas, &dom.expenses_text)),
        calle,
        altura,
        barrio,
        localidad,
        m2_total: or_else(m2_total, &first_digit_run(&dom.m2_total)),
        m2_cubierta: or_else(m2_cubierta, &first_digit_run(&dom.m2_cubierta)),
        ambientes: or_else(ambientes, &first_digit_run(&dom.ambientes)),
        dormitorios: or_else(dormitorios, &first_digit_run(&dom.dormitorios)),
        banios: or_else(banios, &first_digit_run(&dom.banios)),
        cocheras: or_else(cocheras, &first_digit_run(&dom.cocheras)),
        antiguedad: or_else(antiguedad, &dom.antiguedad),
    }
}
