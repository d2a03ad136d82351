use crate::errors::ServerError;
use rusqlite::{params, Connection};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ScrapeRun {
    pub id: i64,
    pub agency_url: String,
    pub started_at: i64,
    pub finished_at: Option<i64>,
    pub pages_fetched: Option<i64>,
    pub listings_discovered: Option<i64>,
    pub records_saved: Option<i64>,
    pub success: bool,
    pub error_message: Option<String>,
}

/// What a finished run reports back to `scrape_runs`.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub pages_fetched: u32,
    pub listings_discovered: usize,
    pub records_saved: usize,
    pub error: Option<String>,
}

pub fn start_scrape_run(conn: &Connection, agency_url: &str, now: i64) -> Result<i64, ServerError> {
    conn.execute(
        "INSERT INTO scrape_runs (agency_url, started_at, success) VALUES (?, ?, 0)",
        params![agency_url, now],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn end_scrape_run(
    conn: &Connection,
    run_id: i64,
    now: i64,
    outcome: &RunOutcome,
) -> Result<(), ServerError> {
    conn.execute(
        "UPDATE scrape_runs SET finished_at = ?, pages_fetched = ?, listings_discovered = ?, records_saved = ?, success = ?, error_message = ? WHERE id = ?",
        params![
            now,
            outcome.pages_fetched,
            outcome.listings_discovered,
            outcome.records_saved,
            outcome.error.is_none(),
            outcome.error,
            run_id
        ],
    )?;
    Ok(())
}

pub fn get_recent_scrapes(conn: &Connection) -> Result<Vec<ScrapeRun>, ServerError> {
    let mut stmt = conn.prepare(
        "SELECT id, agency_url, started_at, finished_at, pages_fetched, listings_discovered, records_saved, success, error_message FROM scrape_runs ORDER BY started_at DESC, id DESC LIMIT 50",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(ScrapeRun {
            id: row.get(0)?,
            agency_url: row.get(1)?,
            started_at: row.get(2)?,
            finished_at: row.get(3)?,
            pages_fetched: row.get(4)?,
            listings_discovered: row.get(5)?,
            records_saved: row.get(6)?,
            success: row.get(7)?,
            error_message: row.get(8)?,
        })
    })?;

    let mut runs = Vec::new();
    for r in rows {
        runs.push(r?);
    }
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_run_lifecycle() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(include_str!("../../sql/schema.sql")).unwrap();

        let first = start_scrape_run(&conn, "https://a/x.html", 10).unwrap();
        let second = start_scrape_run(&conn, "https://a/y.html", 20).unwrap();

        let ok = RunOutcome {
            pages_fetched: 3,
            listings_discovered: 42,
            records_saved: 40,
            error: None,
        };
        end_scrape_run(&conn, first, 15, &ok).unwrap();

        let failed = RunOutcome {
            error: Some("browser session error".into()),
            ..Default::default()
        };
        end_scrape_run(&conn, second, 21, &failed).unwrap();

        let runs = get_recent_scrapes(&conn).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].id, second);
        assert!(!runs[0].success);
        assert_eq!(runs[0].error_message.as_deref(), Some("browser session error"));
        assert!(runs[1].success);
        assert_eq!(runs[1].listings_discovered, Some(42));
        assert_eq!(runs[1].records_saved, Some(40));
    }
}
