use chrono::{Months, Utc};
use std::sync::Arc;

use crate::assistant::Assistant;
use crate::config;
use crate::models::{Book, BookPatch, BookSearchResult, BookSuggestion, NewBook};
use crate::progress;
use crate::session::{Identity, IdentityProvider};
use crate::store::{BookStore, Subscription, WatchCallback};
use crate::{error::Result, RitmoError};

/// Page count assumed for a search hit that doesn't report one.
const DEFAULT_SEARCH_RESULT_PAGES: i64 = 300;

/// The operations a library view invokes, wired over the identity provider,
/// the book store and the assistant.
///
/// Everything works on behalf of the current identity; calls made while
/// signed out fail with a validation error before touching the store.
pub struct Tracker {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<BookStore>,
    assistant: Assistant,
}

impl Tracker {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<BookStore>,
        assistant: Assistant,
    ) -> Self {
        Tracker {
            identity,
            store,
            assistant,
        }
    }

    /// Wires a tracker from the on-disk configuration and the default
    /// database location.
    pub fn from_config(identity: Arc<dyn IdentityProvider>) -> Result<Self> {
        let config = config::load_config()?;
        let store = BookStore::open(crate::store::default_db_path()?)?;

        Ok(Tracker::new(
            identity,
            Arc::new(store),
            Assistant::from_config(&config)?,
        ))
    }

    fn current_identity(&self) -> Result<Identity> {
        self.identity
            .current_identity()
            .ok_or_else(|| RitmoError::Validation("Not signed in".to_string()))
    }

    /// Validates and creates a book. The store applies its create-time
    /// defaults (zero pages read, empty daily progress).
    pub fn add_book(&self, new_book: NewBook) -> Result<Book> {
        let owner = self.current_identity()?;
        new_book.validate()?;
        self.store.add_book(&owner, new_book)
    }

    /// Adds a book picked from the online search, defaulting what the hit
    /// omits: an assumed page count and a one-month reading window starting
    /// today.
    pub fn add_search_result(&self, result: BookSearchResult) -> Result<Book> {
        let today = Utc::now().date_naive();
        let target_end_date = today
            .checked_add_months(Months::new(1))
            .unwrap_or(today);

        self.add_book(NewBook {
            name: result.title,
            author: result.author,
            year: result.year,
            total_pages: result.pages.unwrap_or(DEFAULT_SEARCH_RESULT_PAGES),
            start_date: today,
            target_end_date,
            cover_image_url: result.cover_url.filter(|url| !url.is_empty()),
        })
    }

    /// Applies a field edit, re-checking the entry-time invariants on the
    /// resulting book before anything is written.
    pub fn edit_book(&self, id: &str, patch: &BookPatch) -> Result<Book> {
        let owner = self.current_identity()?;
        let mut book = self
            .store
            .get_book(&owner, id)?
            .ok_or_else(|| RitmoError::NotFound(format!("Book {} not found", id)))?;

        patch.apply(&mut book);
        book.validate()?;

        self.store.update_book(&owner, id, patch)
    }

    pub fn remove_book(&self, id: &str) -> Result<()> {
        let owner = self.current_identity()?;
        self.store.delete_book(&owner, id)
    }

    pub fn books(&self) -> Result<Vec<Book>> {
        let owner = self.current_identity()?;
        self.store.list_books(&owner)
    }

    pub fn book(&self, id: &str) -> Result<Book> {
        let owner = self.current_identity()?;
        self.store
            .get_book(&owner, id)?
            .ok_or_else(|| RitmoError::NotFound(format!("Book {} not found", id)))
    }

    /// Registers a live-list observer for the current identity's books.
    pub fn watch_books(&self, callback: WatchCallback) -> Result<Subscription> {
        let owner = self.current_identity()?;
        self.store.watch(&owner, callback)
    }

    /// Logs pages read today against the book's running totals.
    pub fn log_reading(&self, id: &str, pages: i64) -> Result<Book> {
        let owner = self.current_identity()?;
        let book = self
            .store
            .get_book(&owner, id)?
            .ok_or_else(|| RitmoError::NotFound(format!("Book {} not found", id)))?;

        let now = Utc::now();
        let patch = progress::record_daily_progress(&book, pages, now.date_naive(), now)?;
        self.store.update_book(&owner, id, &patch)
    }

    /// Moves the bookmark without touching the progress accounting.
    pub fn set_bookmark(&self, id: &str, page: i64) -> Result<Book> {
        let owner = self.current_identity()?;
        let book = self
            .store
            .get_book(&owner, id)?
            .ok_or_else(|| RitmoError::NotFound(format!("Book {} not found", id)))?;

        let patch = progress::set_bookmark(&book, page)?;
        self.store.update_book(&owner, id, &patch)
    }

    pub async fn autocomplete_title(&self, partial_title: &str) -> Vec<String> {
        self.assistant.autocomplete_title(partial_title).await
    }

    pub async fn reading_suggestions(&self, title: &str, author: &str) -> Vec<BookSuggestion> {
        self.assistant.reading_suggestions(title, author).await
    }

    pub async fn cover_candidates(
        &self,
        title: &str,
        author: &str,
        year: Option<i32>,
    ) -> Vec<String> {
        self.assistant.cover_candidates(title, author, year).await
    }

    pub async fn search_books(&self, query: &str) -> Vec<BookSearchResult> {
        self.assistant.search_books(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::TextCompletion;
    use crate::session::FixedIdentity;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct Canned(&'static str);

    #[async_trait]
    impl TextCompletion for Canned {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct SignedOut;

    impl IdentityProvider for SignedOut {
        fn current_identity(&self) -> Option<Identity> {
            None
        }
    }

    fn tracker() -> Tracker {
        Tracker::new(
            Arc::new(FixedIdentity::new("u1")),
            Arc::new(BookStore::open_in_memory().unwrap()),
            Assistant::new(Arc::new(Canned(""))),
        )
    }

    fn new_book() -> NewBook {
        NewBook {
            name: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            year: Some(1965),
            total_pages: 300,
            start_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            target_end_date: NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
            cover_image_url: None,
        }
    }

    #[test]
    fn test_operations_require_an_identity() {
        let tracker = Tracker::new(
            Arc::new(SignedOut),
            Arc::new(BookStore::open_in_memory().unwrap()),
            Assistant::new(Arc::new(Canned(""))),
        );

        assert!(tracker.add_book(new_book()).is_err());
        assert!(tracker.books().is_err());
        assert!(tracker.log_reading("x", 10).is_err());
    }

    #[test]
    fn test_add_validates_before_storing() {
        let tracker = tracker();
        let mut invalid = new_book();
        invalid.total_pages = 0;

        assert!(tracker.add_book(invalid).is_err());
        assert!(tracker.books().unwrap().is_empty());
    }

    #[test]
    fn test_log_reading_through_to_completion() {
        let tracker = tracker();
        let book = tracker.add_book(new_book()).unwrap();

        let book = tracker.log_reading(&book.id, 270).unwrap();
        assert_eq!(book.pages_read, 270);
        assert!(!book.is_completed());

        let err = tracker.log_reading(&book.id, 40).unwrap_err();
        assert!(err.to_string().contains("30"));

        let book = tracker.log_reading(&book.id, 30).unwrap();
        assert!(book.is_completed());
        assert_eq!(tracker.book(&book.id).unwrap().pages_read, 300);
    }

    #[test]
    fn test_bookmark_is_independent_of_progress() {
        let tracker = tracker();
        let book = tracker.add_book(new_book()).unwrap();

        let book = tracker.set_bookmark(&book.id, 120).unwrap();
        assert_eq!(book.current_page, Some(120));
        assert_eq!(book.pages_read, 0);

        assert!(tracker.set_bookmark(&book.id, 301).is_err());
    }

    #[test]
    fn test_edit_rejects_inverted_dates() {
        let tracker = tracker();
        let book = tracker.add_book(new_book()).unwrap();

        let patch = BookPatch {
            target_end_date: Some(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()),
            ..BookPatch::default()
        };
        assert!(tracker.edit_book(&book.id, &patch).is_err());

        let unchanged = tracker.book(&book.id).unwrap();
        assert_eq!(
            unchanged.target_end_date,
            NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()
        );
    }

    #[test]
    fn test_add_search_result_defaults() {
        let tracker = tracker();
        let book = tracker
            .add_search_result(BookSearchResult {
                title: "Emma".to_string(),
                author: "Jane Austen".to_string(),
                year: None,
                pages: None,
                cover_url: Some(String::new()),
                description: None,
            })
            .unwrap();

        assert_eq!(book.total_pages, 300);
        assert!(book.cover_image_url.is_none());
        assert!(book.start_date <= book.target_end_date);
    }
}
