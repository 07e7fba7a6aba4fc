use rusqlite::{Connection, Result};
use tracing::info;

/// Creates the books table and its indexes if they don't exist.
///
/// Calendar dates are stored as ISO-8601 text, instants as RFC 3339 text,
/// and the per-day progress map as a JSON object keyed by ISO date.
pub fn create_tables(conn: &Connection) -> Result<()> {
    info!("Creating database schema");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS books (
            id TEXT PRIMARY KEY,
            owner TEXT NOT NULL,
            name TEXT NOT NULL,
            author TEXT NOT NULL,
            year INTEGER,
            total_pages INTEGER NOT NULL,
            pages_read INTEGER NOT NULL DEFAULT 0,
            current_page INTEGER,
            start_date TEXT NOT NULL,
            target_end_date TEXT NOT NULL,
            cover_image_url TEXT,
            daily_progress TEXT NOT NULL DEFAULT '{}',
            last_read_date TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_books_owner ON books(owner)",
        [],
    )?;

    Ok(())
}
