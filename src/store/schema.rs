use anyhow::Result;
use log::debug;
use rusqlite::Connection;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS summaries (
        id  INTEGER PRIMARY KEY AUTOINCREMENT,
        key TEXT    NOT NULL UNIQUE,
        doc TEXT    NOT NULL
    );

    CREATE TABLE IF NOT EXISTS flows (
        id     INTEGER PRIMARY KEY AUTOINCREMENT,
        sum_id INTEGER NOT NULL REFERENCES summaries(id),
        doc    TEXT    NOT NULL
    );

    CREATE INDEX IF NOT EXISTS flows_sum_id ON flows(sum_id);
";

pub fn init(conn: &Connection) -> Result<()> {
    let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.execute_batch(SCHEMA)?;
    debug!("store journal mode {}", mode);
    Ok(())
}
