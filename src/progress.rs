use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{Book, BookPatch};
use crate::{error::Result, RitmoError};

/// Validates a day's reading and produces the partial update to persist.
///
/// Rejections leave the book untouched: non-positive amounts, and amounts
/// larger than what is left of the book (the message cites the exact
/// remaining count). On success `pages_read` grows capped at `total_pages`
/// and the day's entry in `daily_progress` accumulates additively, so
/// logging twice on the same date sums rather than overwrites.
pub fn record_daily_progress(
    book: &Book,
    pages_to_add: i64,
    date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<BookPatch> {
    if pages_to_add <= 0 {
        return Err(RitmoError::Validation(
            "Pages read must be a positive number".to_string(),
        ));
    }

    let remaining_pages = book.total_pages - book.pages_read;
    if pages_to_add > remaining_pages {
        return Err(RitmoError::Validation(format!(
            "Only {} pages left to finish the book",
            remaining_pages
        )));
    }

    let mut daily_progress = book.daily_progress.clone();
    *daily_progress.entry(date.to_string()).or_insert(0) += pages_to_add;

    Ok(BookPatch {
        pages_read: Some((book.pages_read + pages_to_add).min(book.total_pages)),
        daily_progress: Some(daily_progress),
        last_read_date: Some(now),
        ..BookPatch::default()
    })
}

/// Moves the bookmark to `page`.
///
/// A bookmark is a position, not progress: it never touches `pages_read` or
/// the daily accounting. Page 0 (not started) through `total_pages` (back
/// cover) are all valid positions.
pub fn set_bookmark(book: &Book, page: i64) -> Result<BookPatch> {
    if page < 0 || page > book.total_pages {
        return Err(RitmoError::Validation(format!(
            "Page must be between 0 and {}",
            book.total_pages
        )));
    }

    Ok(BookPatch {
        current_page: Some(page),
        ..BookPatch::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Identity;
    use std::collections::BTreeMap;

    fn book(total_pages: i64, pages_read: i64) -> Book {
        let now = Utc::now();
        Book {
            id: "b1".to_string(),
            owner: Identity::new("u1"),
            name: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            year: Some(1965),
            total_pages,
            pages_read,
            current_page: None,
            start_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            target_end_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            cover_image_url: None,
            daily_progress: BTreeMap::new(),
            last_read_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()
    }

    #[test]
    fn test_rejects_zero_and_negative_pages() {
        let book = book(300, 0);
        assert!(record_daily_progress(&book, 0, today(), Utc::now()).is_err());
        assert!(record_daily_progress(&book, -5, today(), Utc::now()).is_err());
    }

    #[test]
    fn test_rejects_overshoot_citing_remaining() {
        let book = book(300, 270);
        let err = record_daily_progress(&book, 40, today(), Utc::now()).unwrap_err();
        assert!(err.to_string().contains("30"), "message was: {}", err);
    }

    #[test]
    fn test_exact_remainder_completes_the_book() {
        let mut book = book(300, 270);
        let patch = record_daily_progress(&book, 30, today(), Utc::now()).unwrap();
        patch.apply(&mut book);
        assert_eq!(book.pages_read, 300);
        assert!(book.is_completed());
    }

    #[test]
    fn test_same_date_accumulates() {
        let mut book = book(300, 0);
        let date = today();

        let patch = record_daily_progress(&book, 10, date, Utc::now()).unwrap();
        patch.apply(&mut book);
        let patch = record_daily_progress(&book, 5, date, Utc::now()).unwrap();
        patch.apply(&mut book);

        assert_eq!(book.pages_read, 15);
        assert_eq!(book.pages_read_on(date), 15);
    }

    #[test]
    fn test_distinct_dates_get_distinct_entries() {
        let mut book = book(300, 0);
        let first = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        let second = NaiveDate::from_ymd_opt(2024, 5, 4).unwrap();

        let patch = record_daily_progress(&book, 12, first, Utc::now()).unwrap();
        patch.apply(&mut book);
        let patch = record_daily_progress(&book, 8, second, Utc::now()).unwrap();
        patch.apply(&mut book);

        assert_eq!(book.pages_read_on(first), 12);
        assert_eq!(book.pages_read_on(second), 8);
        assert_eq!(book.pages_read, 20);
    }

    #[test]
    fn test_success_stamps_last_read_date() {
        let mut book = book(300, 0);
        let now = Utc::now();
        let patch = record_daily_progress(&book, 10, today(), now).unwrap();
        patch.apply(&mut book);
        assert_eq!(book.last_read_date, Some(now));
    }

    #[test]
    fn test_bookmark_rejects_out_of_range() {
        let book = book(300, 0);
        assert!(set_bookmark(&book, -1).is_err());
        assert!(set_bookmark(&book, 301).is_err());
    }

    #[test]
    fn test_bookmark_accepts_bounds_and_leaves_progress_alone() {
        let mut book = book(300, 40);

        let patch = set_bookmark(&book, 0).unwrap();
        patch.apply(&mut book);
        assert_eq!(book.current_page, Some(0));

        let patch = set_bookmark(&book, 300).unwrap();
        patch.apply(&mut book);
        assert_eq!(book.current_page, Some(300));
        assert_eq!(book.pages_read, 40);
        assert!(book.daily_progress.is_empty());
    }
}
