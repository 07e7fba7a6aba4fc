mod books;
mod schema;
mod watch;

pub use books::BookStoreError;
pub use watch::{Subscription, WatchCallback};

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

use crate::models::{Book, BookPatch, NewBook};
use crate::session::Identity;
use crate::{error::Result, RitmoError};
use watch::WatchRegistry;

impl From<BookStoreError> for RitmoError {
    fn from(err: BookStoreError) -> Self {
        match err {
            BookStoreError::NotFound => RitmoError::NotFound("Book not found".to_string()),
            BookStoreError::Database(e) => RitmoError::Database(e),
            BookStoreError::Serialize(e) => RitmoError::Internal(e.to_string()),
        }
    }
}

/// Default location of the book database file.
pub fn default_db_path() -> Result<PathBuf> {
    let mut path = dirs::data_dir()
        .ok_or_else(|| RitmoError::Config("Failed to get data directory".to_string()))?;

    path.push("ritmo");
    std::fs::create_dir_all(&path)?;

    path.push("books.db");
    Ok(path)
}

/// SQLite-backed per-identity book collection.
///
/// Each book belongs to exactly one identity; queries never cross owners.
/// The store owns the create-time defaults (zero pages read, empty daily
/// progress) and notifies the owner's registered watchers with the refreshed
/// list after every successful mutation. Partial updates are last-write-wins.
pub struct BookStore {
    conn: Mutex<Connection>,
    watchers: Arc<WatchRegistry>,
}

impl BookStore {
    /// Opens (creating if necessary) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        info!("Opening book database: {:?}", path.as_ref());

        let conn = Connection::open(path)?;

        // journal_mode returns a value, so we use query_row
        let _journal_mode =
            conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get::<_, String>(0))?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        schema::create_tables(&conn)?;

        Ok(BookStore {
            conn: Mutex::new(conn),
            watchers: Arc::new(WatchRegistry::default()),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::create_tables(&conn)?;

        Ok(BookStore {
            conn: Mutex::new(conn),
            watchers: Arc::new(WatchRegistry::default()),
        })
    }

    /// Creates a book for `owner` with the store-owned defaults applied.
    pub fn add_book(&self, owner: &Identity, new_book: NewBook) -> Result<Book> {
        let book = books::insert(&self.lock_conn(), owner, new_book)?;
        info!("Added book {} for {}", book.id, owner);
        self.notify(owner)?;
        Ok(book)
    }

    /// Applies a partial update and returns the updated book.
    pub fn update_book(&self, owner: &Identity, id: &str, patch: &BookPatch) -> Result<Book> {
        let book = books::update(&self.lock_conn(), owner, id, patch)?;
        self.notify(owner)?;
        Ok(book)
    }

    pub fn delete_book(&self, owner: &Identity, id: &str) -> Result<()> {
        books::delete(&self.lock_conn(), owner, id)?;
        info!("Deleted book {} for {}", id, owner);
        self.notify(owner)?;
        Ok(())
    }

    /// The owner's books, newest first.
    pub fn list_books(&self, owner: &Identity) -> Result<Vec<Book>> {
        Ok(books::list_for(&self.lock_conn(), owner)?)
    }

    pub fn get_book(&self, owner: &Identity, id: &str) -> Result<Option<Book>> {
        Ok(books::get(&self.lock_conn(), owner, id)?)
    }

    /// Registers a live-list observer for `owner`.
    ///
    /// The callback sees the current list immediately, then the refreshed
    /// list after each mutation, until the returned `Subscription` is
    /// dropped.
    pub fn watch(&self, owner: &Identity, callback: WatchCallback) -> Result<Subscription> {
        let books = self.list_books(owner)?;
        callback(&books);
        Ok(WatchRegistry::register(
            &self.watchers,
            owner.clone(),
            callback,
        ))
    }

    fn notify(&self, owner: &Identity) -> Result<()> {
        let books = self.list_books(owner)?;
        self.watchers.notify(owner, &books);
        Ok(())
    }

    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}
