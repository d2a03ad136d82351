use crate::config::{Cli, Command, Config};
use crate::db::{init_db, Database};
use crate::responses::error_to_response;
use crate::router::{handle, AppState};
use crate::scraper::browser::{HtmlBrowser, HttpFetcher};
use crate::scraper::AgencyScraper;
use crate::sink::{RecordSink, SqliteSink, XlsxSink};
use astra::Server;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod domain;
mod errors;
mod responses;
mod router;
mod scraper;
mod sink;
mod spreadsheets;

#[cfg(test)]
mod tests;

fn main() -> ExitCode {
    // A missing .env is fine; real env vars still apply.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let db = Database::new(&cli.config.database);
    if let Err(e) = init_db(&db) {
        error!(error = %e, "database initialization failed");
        return ExitCode::FAILURE;
    }

    match cli.command {
        Some(Command::Scrape { agency, xlsx }) => scrape_once(&cli.config, db, agency, xlsx),
        Some(Command::Serve) | None => serve(cli.config, db),
    }
}

fn serve(config: Config, db: Database) -> ExitCode {
    let addr = config.addr;
    let state = AppState {
        db,
        settings: config.scrape_settings(),
        default_agency: config.agency_url,
        running: Arc::new(AtomicBool::new(false)),
    };

    info!("starting server at http://{addr}");
    let server = Server::bind(&addr).max_workers(8);

    let result = server.serve(move |req, _info| match handle(req, &state) {
        Ok(resp) => resp,
        Err(err) => error_to_response(err),
    });

    match result {
        Ok(()) => {
            info!("server shut down cleanly");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "server ended with error");
            ExitCode::FAILURE
        }
    }
}

fn scrape_once(
    config: &Config,
    db: Database,
    agency: Option<String>,
    xlsx: Option<PathBuf>,
) -> ExitCode {
    let settings = config.scrape_settings();
    let agency = agency.unwrap_or_else(|| config.agency_url.clone());

    let mut sink: Box<dyn RecordSink> = match xlsx {
        Some(path) => Box::new(XlsxSink::new(path)),
        None => Box::new(SqliteSink::new(db)),
    };

    let scraper = AgencyScraper::new(&settings.discovery, &settings.extract, &settings.pacing);
    match scraper.run(HtmlBrowser::<HttpFetcher>::launch, &agency, sink.as_mut()) {
        Ok(summary) => {
            info!(
                discovered = summary.discovered,
                saved = summary.saved,
                failed = summary.failed,
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "scrape could not start");
            ExitCode::FAILURE
        }
    }
}
