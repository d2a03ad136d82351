use crate::config::DEFAULT_SITE_ORIGIN;
use crate::db::{init_db, Database};
use crate::router::AppState;
use crate::scraper::discover::DiscoverySettings;
use crate::scraper::extract::ExtractSettings;
use crate::scraper::pacing::JitteredPacer;
use crate::scraper::ScrapeSettings;
use astra::{Body, Request, Response};
use std::io::Read;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Fresh database file in the temp dir, with the production schema applied.
pub fn make_db(label: &str) -> Database {
    let path = std::env::temp_dir().join(format!(
        "{label}_{}.sqlite3",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    let db = Database::new(path);
    init_db(&db).unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    db
}

pub fn test_state(db: Database) -> AppState {
    AppState {
        db,
        settings: ScrapeSettings {
            discovery: DiscoverySettings {
                site_origin: DEFAULT_SITE_ORIGIN.parse().unwrap(),
                max_pages: 1,
                page_timeout: Duration::from_secs(1),
            },
            extract: ExtractSettings {
                navigation_timeout: Duration::from_secs(1),
                content_timeout: Duration::from_millis(10),
            },
            pacing: JitteredPacer {
                page_delay: Duration::ZERO,
                listing_delay: Duration::ZERO,
                listing_jitter: Duration::ZERO,
            },
        },
        default_agency: "https://www.zonaprop.com.ar/inmobiliarias/acme_123-inmuebles.html".into(),
        running: Arc::new(AtomicBool::new(false)),
    }
}

pub fn request(method: &str, uri: &str) -> Request {
    http::Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn body_bytes(resp: &mut Response) -> Vec<u8> {
    let mut buf = Vec::new();
    resp.body_mut().reader().read_to_end(&mut buf).unwrap();
    buf
}

pub fn body_json(resp: &mut Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(resp)).unwrap()
}
