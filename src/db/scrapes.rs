use crate::errors::ServerError;
use rusqlite::{params, Connection};

#[derive(Debug, Clone)]
pub struct ScrapeRun {
    pub id: i64,
    pub sources: String,
    pub started_at: i64,
    pub finished_at: Option<i64>,
    pub pages_fetched: Option<i64>,
    pub listings_seen: Option<i64>,
    pub success: bool,
    pub error_message: Option<String>,
}

pub fn start_scrape_run(conn: &Connection, sources: &str, now: i64) -> Result<i64, ServerError> {
    conn.execute(
        "INSERT INTO scrape_runs (sources, started_at, success) VALUES (?, ?, 0)",
        params![sources, now],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn end_scrape_run(
    conn: &Connection,
    run_id: i64,
    now: i64,
    pages: usize,
    listings: usize,
    success: bool,
    error: Option<String>,
) -> Result<(), ServerError> {
    conn.execute(
        "UPDATE scrape_runs SET finished_at = ?, pages_fetched = ?, listings_seen = ?, success = ?, error_message = ? WHERE id = ?",
        params![now, pages as i64, listings as i64, success, error, run_id],
    )?;
    Ok(())
}

pub fn get_recent_scrapes(conn: &Connection, limit: usize) -> Result<Vec<ScrapeRun>, ServerError> {
    let mut stmt = conn.prepare(
        "SELECT id, sources, started_at, finished_at, pages_fetched, listings_seen, success, error_message
         FROM scrape_runs ORDER BY started_at DESC, id DESC LIMIT ?",
    )?;

    let rows = stmt.query_map(params![limit as i64], |row| {
        Ok(ScrapeRun {
            id: row.get(0)?,
            sources: row.get(1)?,
            started_at: row.get(2)?,
            finished_at: row.get(3)?,
            pages_fetched: row.get(4)?,
            listings_seen: row.get(5)?,
            success: row.get(6)?,
            error_message: row.get(7)?,
        })
    })?;

    let mut runs = Vec::new();
    for r in rows {
        runs.push(r?);
    }
    Ok(runs)
}
