//! The rolling lookback window expressed in epidemiological weeks.

use chrono::{Datelike, Months, NaiveDate};

/// How far back the dashboard looks from today.
pub const LOOKBACK_MONTHS: u32 = 3;

/// Start and end of the lookback, as ISO-8601 week numbers and ISO
/// week-based years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpiWindow {
    pub week_start: u32,
    pub week_end: u32,
    pub year_start: i32,
    pub year_end: i32,
}

impl EpiWindow {
    /// Window covering `[today - 3 months, today]`.
    ///
    /// Month subtraction clamps to the last day of the target month, so
    /// 2024-05-31 starts on 2024-02-29.
    pub fn ending(today: NaiveDate) -> Self {
        let start = today
            .checked_sub_months(Months::new(LOOKBACK_MONTHS))
            .unwrap_or(NaiveDate::MIN);
        let (start, end) = (start.iso_week(), today.iso_week());

        Self {
            week_start: start.week(),
            week_end: end.week(),
            year_start: start.year(),
            year_end: end.year(),
        }
    }

    /// Query parameters understood by the surveillance API.
    pub fn query_pairs(&self) -> [(&'static str, String); 4] {
        [
            ("ew_start", self.week_start.to_string()),
            ("ew_end", self.week_end.to_string()),
            ("ey_start", self.year_start.to_string()),
            ("ey_end", self.year_end.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_mid_year_window() {
        let window = EpiWindow::ending(date(2024, 6, 15));
        let start = date(2024, 3, 15).iso_week();
        let end = date(2024, 6, 15).iso_week();

        assert_eq!(window.week_start, start.week());
        assert_eq!(window.year_start, start.year());
        assert_eq!(window.week_end, end.week());
        assert_eq!(window.year_end, end.year());
        assert_eq!((window.week_start, window.week_end), (11, 24));
    }

    #[test]
    fn test_month_end_is_clamped() {
        // 2024-05-31 minus three months lands on 2024-02-29
        let window = EpiWindow::ending(date(2024, 5, 31));
        assert_eq!(window.week_start, 9);
        assert_eq!(window.year_start, 2024);
    }

    #[test]
    fn test_window_crossing_iso_year_boundary() {
        // 2020-12-31 belongs to ISO week 53 of 2020
        let window = EpiWindow::ending(date(2021, 3, 31));
        assert_eq!((window.week_start, window.year_start), (53, 2020));
        assert_eq!((window.week_end, window.year_end), (13, 2021));
    }

    #[test]
    fn test_iso_year_differs_from_calendar_year() {
        let window = EpiWindow::ending(date(2021, 1, 2));
        assert_eq!((window.week_end, window.year_end), (53, 2020));
    }

    #[test]
    fn test_query_pairs() {
        let window = EpiWindow {
            week_start: 11,
            week_end: 24,
            year_start: 2024,
            year_end: 2024,
        };
        let pairs = window.query_pairs();
        assert_eq!(pairs[0], ("ew_start", "11".to_string()));
        assert_eq!(pairs[1], ("ew_end", "24".to_string()));
        assert_eq!(pairs[2], ("ey_start", "2024".to_string()));
        assert_eq!(pairs[3], ("ey_end", "2024".to_string()));
    }
}
