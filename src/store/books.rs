use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Result, Row};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Book, BookPatch, NewBook};
use crate::session::Identity;

#[derive(Error, Debug)]
pub enum BookStoreError {
    #[error("Book not found")]
    NotFound,
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

const BOOK_COLUMNS: &str = "id, owner, name, author, year, total_pages, pages_read, \
     current_page, start_date, target_end_date, cover_image_url, daily_progress, \
     last_read_date, created_at, updated_at";

/// Inserts a new book owned by `owner`.
///
/// Generates a UUID v4 id and stamps both timestamps. The store owns the
/// create-time defaults: `pages_read` starts at zero and `daily_progress`
/// empty whatever the creation payload carries elsewhere.
pub fn insert(
    conn: &Connection,
    owner: &Identity,
    new_book: NewBook,
) -> Result<Book, BookStoreError> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    let book = Book {
        id,
        owner: owner.clone(),
        name: new_book.name,
        author: new_book.author,
        year: new_book.year,
        total_pages: new_book.total_pages,
        pages_read: 0,
        current_page: None,
        start_date: new_book.start_date,
        target_end_date: new_book.target_end_date,
        cover_image_url: new_book.cover_image_url,
        daily_progress: BTreeMap::new(),
        last_read_date: None,
        created_at: now,
        updated_at: now,
    };

    conn.execute(
        "INSERT INTO books (id, owner, name, author, year, total_pages, pages_read,
             current_page, start_date, target_end_date, cover_image_url, daily_progress,
             last_read_date, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            &book.id,
            book.owner.as_str(),
            &book.name,
            &book.author,
            book.year,
            book.total_pages,
            book.pages_read,
            book.current_page,
            book.start_date.to_string(),
            book.target_end_date.to_string(),
            &book.cover_image_url,
            serde_json::to_string(&book.daily_progress)?,
            book.last_read_date.map(|t| t.to_rfc3339()),
            book.created_at.to_rfc3339(),
            book.updated_at.to_rfc3339(),
        ],
    )?;

    Ok(book)
}

/// Lists `owner`'s books, newest first. Other identities' rows are invisible.
pub fn list_for(conn: &Connection, owner: &Identity) -> Result<Vec<Book>, BookStoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM books WHERE owner = ?1 ORDER BY created_at DESC",
        BOOK_COLUMNS
    ))?;

    let books = stmt
        .query_map(params![owner.as_str()], book_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(books)
}

/// Gets one of `owner`'s books by id. Returns None if it doesn't exist.
pub fn get(
    conn: &Connection,
    owner: &Identity,
    id: &str,
) -> Result<Option<Book>, BookStoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM books WHERE id = ?1 AND owner = ?2",
        BOOK_COLUMNS
    ))?;

    let books = stmt
        .query_map(params![id, owner.as_str()], book_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(books.into_iter().next())
}

/// Applies a partial update to one of `owner`'s books.
///
/// Only fields present in the patch change; the row is rewritten whole, so
/// concurrent writers resolve last-write-wins. Returns the updated book.
pub fn update(
    conn: &Connection,
    owner: &Identity,
    id: &str,
    patch: &BookPatch,
) -> Result<Book, BookStoreError> {
    let mut book = get(conn, owner, id)?.ok_or(BookStoreError::NotFound)?;

    patch.apply(&mut book);
    book.updated_at = Utc::now();

    conn.execute(
        "UPDATE books SET name = ?3, author = ?4, year = ?5, total_pages = ?6,
             pages_read = ?7, current_page = ?8, start_date = ?9, target_end_date = ?10,
             cover_image_url = ?11, daily_progress = ?12, last_read_date = ?13,
             updated_at = ?14
         WHERE id = ?1 AND owner = ?2",
        params![
            id,
            owner.as_str(),
            &book.name,
            &book.author,
            book.year,
            book.total_pages,
            book.pages_read,
            book.current_page,
            book.start_date.to_string(),
            book.target_end_date.to_string(),
            &book.cover_image_url,
            serde_json::to_string(&book.daily_progress)?,
            book.last_read_date.map(|t| t.to_rfc3339()),
            book.updated_at.to_rfc3339(),
        ],
    )?;

    Ok(book)
}

/// Deletes one of `owner`'s books by id.
///
/// Returns NotFound if no row was affected.
pub fn delete(conn: &Connection, owner: &Identity, id: &str) -> Result<(), BookStoreError> {
    let rows_affected = conn.execute(
        "DELETE FROM books WHERE id = ?1 AND owner = ?2",
        params![id, owner.as_str()],
    )?;

    if rows_affected == 0 {
        return Err(BookStoreError::NotFound);
    }

    Ok(())
}

fn book_from_row(row: &Row<'_>) -> Result<Book> {
    let owner: String = row.get(1)?;
    let start_date: String = row.get(8)?;
    let target_end_date: String = row.get(9)?;
    let daily_progress: String = row.get(11)?;
    let last_read_date: Option<String> = row.get(12)?;
    let created_at: String = row.get(13)?;
    let updated_at: String = row.get(14)?;

    Ok(Book {
        id: row.get(0)?,
        owner: Identity::new(owner),
        name: row.get(2)?,
        author: row.get(3)?,
        year: row.get(4)?,
        total_pages: row.get(5)?,
        pages_read: row.get(6)?,
        current_page: row.get(7)?,
        start_date: parse_date(8, &start_date)?,
        target_end_date: parse_date(9, &target_end_date)?,
        cover_image_url: row.get(10)?,
        daily_progress: parse_progress_map(11, &daily_progress)?,
        last_read_date: last_read_date
            .map(|value| parse_instant(12, &value))
            .transpose()?,
        created_at: parse_instant(13, &created_at)?,
        updated_at: parse_instant(14, &updated_at)?,
    })
}

fn parse_date(index: usize, value: &str) -> Result<NaiveDate> {
    value
        .parse()
        .map_err(|e: chrono::ParseError| conversion_error(index, e))
}

fn parse_instant(index: usize, value: &str) -> Result<DateTime<Utc>> {
    value
        .parse()
        .map_err(|e: chrono::ParseError| conversion_error(index, e))
}

fn parse_progress_map(index: usize, value: &str) -> Result<BTreeMap<String, i64>> {
    serde_json::from_str(value).map_err(|e| conversion_error(index, e))
}

fn conversion_error(
    index: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}
