use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::session::Identity;
use crate::{error::Result, RitmoError};

/// A tracked reading project.
///
/// `pages_read` counts logged reading and never exceeds `total_pages`.
/// `current_page` is a bookmark position kept independent of the progress
/// accounting: a reader may move the bookmark without logging pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub owner: Identity,
    pub name: String,
    pub author: String,
    pub year: Option<i32>,
    pub total_pages: i64,
    pub pages_read: i64,
    pub current_page: Option<i64>,
    pub start_date: NaiveDate,
    pub target_end_date: NaiveDate,
    pub cover_image_url: Option<String>,
    /// Pages logged per ISO calendar date. Keys accumulate; they are never
    /// overwritten or removed by progress logging.
    pub daily_progress: BTreeMap<String, i64>,
    pub last_read_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Completion is derived, never stored.
    pub fn is_completed(&self) -> bool {
        self.pages_read >= self.total_pages
    }

    pub fn remaining_pages(&self) -> i64 {
        (self.total_pages - self.pages_read).max(0)
    }

    /// Pages logged on the given calendar date.
    pub fn pages_read_on(&self, date: NaiveDate) -> i64 {
        self.daily_progress
            .get(&date.to_string())
            .copied()
            .unwrap_or(0)
    }

    pub fn progress_percent(&self) -> f64 {
        if self.total_pages <= 0 {
            return 0.0;
        }
        (self.pages_read as f64 / self.total_pages as f64 * 100.0).min(100.0)
    }

    /// Suggested pages to read today to finish on schedule.
    pub fn daily_goal(&self) -> i64 {
        crate::goal::daily_goal(
            self.start_date,
            self.target_end_date,
            self.total_pages,
            self.pages_read,
        )
    }

    /// Re-checks the entry-time field invariants, used after partial edits.
    pub fn validate(&self) -> Result<()> {
        validate_fields(
            &self.name,
            &self.author,
            self.total_pages,
            self.start_date,
            self.target_end_date,
        )
    }
}

/// Creation payload for a book.
///
/// `pages_read` and `daily_progress` are store-owned defaults and are never
/// supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub name: String,
    pub author: String,
    pub year: Option<i32>,
    pub total_pages: i64,
    pub start_date: NaiveDate,
    pub target_end_date: NaiveDate,
    pub cover_image_url: Option<String>,
}

impl NewBook {
    /// Entry-time validation of the add-book fields. The cover URL is not
    /// checked for reachability; a broken image surfaces at render time.
    pub fn validate(&self) -> Result<()> {
        validate_fields(
            &self.name,
            &self.author,
            self.total_pages,
            self.start_date,
            self.target_end_date,
        )
    }
}

fn validate_fields(
    name: &str,
    author: &str,
    total_pages: i64,
    start_date: NaiveDate,
    target_end_date: NaiveDate,
) -> Result<()> {
    if name.trim().is_empty() {
        return Err(RitmoError::Validation(
            "Book name must not be empty".to_string(),
        ));
    }
    if author.trim().is_empty() {
        return Err(RitmoError::Validation(
            "Author must not be empty".to_string(),
        ));
    }
    if total_pages < 1 {
        return Err(RitmoError::Validation(
            "Total pages must be at least 1".to_string(),
        ));
    }
    if start_date > target_end_date {
        return Err(RitmoError::Validation(
            "Start date must not be after the target end date".to_string(),
        ));
    }
    Ok(())
}

/// Partial update mirroring the repository `update` contract: only present
/// fields are written, last write wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookPatch {
    pub name: Option<String>,
    pub author: Option<String>,
    pub year: Option<i32>,
    pub total_pages: Option<i64>,
    pub pages_read: Option<i64>,
    pub current_page: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub target_end_date: Option<NaiveDate>,
    pub cover_image_url: Option<String>,
    pub daily_progress: Option<BTreeMap<String, i64>>,
    pub last_read_date: Option<DateTime<Utc>>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.author.is_none()
            && self.year.is_none()
            && self.total_pages.is_none()
            && self.pages_read.is_none()
            && self.current_page.is_none()
            && self.start_date.is_none()
            && self.target_end_date.is_none()
            && self.cover_image_url.is_none()
            && self.daily_progress.is_none()
            && self.last_read_date.is_none()
    }

    /// Merges the present fields into `book`.
    pub fn apply(&self, book: &mut Book) {
        if let Some(name) = &self.name {
            book.name = name.clone();
        }
        if let Some(author) = &self.author {
            book.author = author.clone();
        }
        if let Some(year) = self.year {
            book.year = Some(year);
        }
        if let Some(total_pages) = self.total_pages {
            book.total_pages = total_pages;
        }
        if let Some(pages_read) = self.pages_read {
            book.pages_read = pages_read;
        }
        if let Some(current_page) = self.current_page {
            book.current_page = Some(current_page);
        }
        if let Some(start_date) = self.start_date {
            book.start_date = start_date;
        }
        if let Some(target_end_date) = self.target_end_date {
            book.target_end_date = target_end_date;
        }
        if let Some(cover_image_url) = &self.cover_image_url {
            book.cover_image_url = Some(cover_image_url.clone());
        }
        if let Some(daily_progress) = &self.daily_progress {
            book.daily_progress = daily_progress.clone();
        }
        if let Some(last_read_date) = self.last_read_date {
            book.last_read_date = Some(last_read_date);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_book() -> NewBook {
        NewBook {
            name: "The Pragmatic Programmer".to_string(),
            author: "Hunt & Thomas".to_string(),
            year: Some(1999),
            total_pages: 320,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            target_end_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            cover_image_url: None,
        }
    }

    #[test]
    fn test_validate_accepts_well_formed_book() {
        assert!(new_book().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let mut book = new_book();
        book.name = "   ".to_string();
        assert!(book.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_pages() {
        let mut book = new_book();
        book.total_pages = 0;
        assert!(book.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_dates() {
        let mut book = new_book();
        book.start_date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        assert!(book.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_equal_dates() {
        let mut book = new_book();
        book.target_end_date = book.start_date;
        assert!(book.validate().is_ok());
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let now = Utc::now();
        let mut book = Book {
            id: "b1".to_string(),
            owner: Identity::new("u1"),
            name: "Old".to_string(),
            author: "Someone".to_string(),
            year: None,
            total_pages: 100,
            pages_read: 10,
            current_page: None,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            target_end_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            cover_image_url: None,
            daily_progress: BTreeMap::new(),
            last_read_date: None,
            created_at: now,
            updated_at: now,
        };

        let patch = BookPatch {
            name: Some("New".to_string()),
            current_page: Some(42),
            ..BookPatch::default()
        };
        patch.apply(&mut book);

        assert_eq!(book.name, "New");
        assert_eq!(book.current_page, Some(42));
        assert_eq!(book.author, "Someone");
        assert_eq!(book.pages_read, 10);
    }
}
