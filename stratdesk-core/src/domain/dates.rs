//! Date-window helpers. All wire dates are `YYYY-MM-DD`.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Most recent weekday at or before `today`. Saturday and Sunday snap back
/// to Friday; markets deliver no bars on weekends.
pub fn trading_end_date(today: NaiveDate) -> NaiveDate {
    match today.weekday() {
        Weekday::Sat => today - Duration::days(1),
        Weekday::Sun => today - Duration::days(2),
        _ => today,
    }
}

/// Weekday-aware end date plus a start date `days` earlier.
pub fn lookback_window(today: NaiveDate, days: i64) -> (NaiveDate, NaiveDate) {
    let end = trading_end_date(today);
    (end - Duration::days(days), end)
}

/// Wire format for dates.
pub fn wire_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekday_passes_through() {
        // 2025-06-04 is a Wednesday.
        assert_eq!(trading_end_date(d(2025, 6, 4)), d(2025, 6, 4));
    }

    #[test]
    fn weekend_snaps_to_friday() {
        // 2025-06-07 is a Saturday, 2025-06-08 a Sunday.
        assert_eq!(trading_end_date(d(2025, 6, 7)), d(2025, 6, 6));
        assert_eq!(trading_end_date(d(2025, 6, 8)), d(2025, 6, 6));
    }

    #[test]
    fn window_spans_requested_days() {
        let (start, end) = lookback_window(d(2025, 6, 8), 365);
        assert_eq!(end, d(2025, 6, 6));
        assert_eq!(end - start, Duration::days(365));
    }

    #[test]
    fn wire_format() {
        assert_eq!(wire_date(d(2025, 1, 5)), "2025-01-05");
    }
}
