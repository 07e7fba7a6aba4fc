use chrono::NaiveDate;

/// Suggested pages-per-day to finish `total_pages` by `target_end_date`.
///
/// The reading window is inclusive of both endpoints, so starting and
/// finishing on the same day is one day of reading. Inverted dates and
/// targets already in the past are not errors: the window collapses to a
/// single day and the goal simply grows.
pub fn daily_goal(
    start_date: NaiveDate,
    target_end_date: NaiveDate,
    total_pages: i64,
    pages_read: i64,
) -> i64 {
    let total_days = (target_end_date - start_date).num_days() + 1;
    let remaining_pages = (total_pages - pages_read).max(0);

    div_ceil(remaining_pages, total_days.max(1))
}

fn div_ceil(numerator: i64, divisor: i64) -> i64 {
    (numerator + divisor - 1) / divisor
}
