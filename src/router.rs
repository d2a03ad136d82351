use crate::db::{properties, scrapes, Database};
use crate::errors::ServerError;
use crate::responses::{json_response, xlsx_response, ResultResp};
use crate::scraper::{spawn_agency_scrape, ScrapeSettings};
use crate::spreadsheets::records_workbook;
use astra::Request;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: ScrapeSettings,
    pub default_agency: String,
    /// Set while a background scrape is in flight.
    pub running: Arc<AtomicBool>,
}

pub fn handle(req: Request, state: &AppState) -> ResultResp {
    let method = req.method().as_str();
    let path = req.uri().path();

    match (method, path) {
        ("GET", "/health") => json_response(200, &json!({ "status": "ok" })),
        ("POST", "/scrape") => start_scrape(&req, state),
        ("GET", "/export.xlsx") => export(state),
        ("GET", "/runs") => {
            let runs = state.db.with_conn(|conn| scrapes::get_recent_scrapes(conn))?;
            json_response(200, &runs)
        }
        _ => Err(ServerError::NotFound),
    }
}

fn start_scrape(req: &Request, state: &AppState) -> ResultResp {
    let params = parse_query(req);
    let agency = params
        .get("agency")
        .cloned()
        .unwrap_or_else(|| state.default_agency.clone());

    if url::Url::parse(&agency).is_err() {
        return Err(ServerError::BadRequest(format!("invalid agency URL: {agency}")));
    }

    if state
        .running
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(ServerError::Conflict("a scrape is already running".into()));
    }

    info!(%agency, "scrape triggered");
    spawn_agency_scrape(
        state.db.clone(),
        state.settings.clone(),
        agency.clone(),
        state.running.clone(),
    );

    json_response(
        202,
        &json!({ "message": "scrape started in the background", "agency": agency }),
    )
}

fn export(state: &AppState) -> ResultResp {
    let records = state.db.with_conn(|conn| properties::all(conn))?;
    let buffer = records_workbook(&records)?;
    xlsx_response(buffer, "propiedades.xlsx")
}

fn parse_query(req: &Request) -> HashMap<String, String> {
    req.uri()
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}
