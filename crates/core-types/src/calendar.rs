//! Calendar-month arithmetic shared by the cohort and revenue models.

use crate::error::CoreError;
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open calendar month, `[start, end)`, where `end` is the first day
/// of the following month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl MonthWindow {
    /// Builds the window for the month containing `date`.
    pub fn containing(date: NaiveDate) -> Result<Self, CoreError> {
        let start = first_of_month(date);
        let end = add_months(start, 1)?;
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

impl fmt::Display for MonthWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start.format("%Y-%m"))
    }
}

/// Truncates a date to the first day of its month.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    // Day 1 exists in every month, so `with_day(1)` cannot fail here.
    date.with_day(1).unwrap_or(date)
}

/// Walks `months` calendar months forward from `date`.
///
/// Day-of-month is clamped the way `chrono` does it (Jan 31 + 1 month is the
/// last day of February), which never matters for month starts.
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate, CoreError> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| CoreError::DateOutOfRange(format!("{date} + {months} months")))
}

/// Generates one window per calendar month from the month of `epoch` through
/// the month containing `today`, inclusive. The final window is the current,
/// usually incomplete, month.
///
/// Returns an empty vector when `epoch` lies after `today`.
pub fn month_windows(epoch: NaiveDate, today: NaiveDate) -> Result<Vec<MonthWindow>, CoreError> {
    let last = first_of_month(today);
    let mut current = first_of_month(epoch);
    let mut windows = Vec::new();

    while current <= last {
        let window = MonthWindow::containing(current)?;
        current = window.end;
        windows.push(window);
    }

    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn windows_include_the_current_partial_month() {
        let windows = month_windows(date(2022, 1, 1), date(2022, 3, 17)).unwrap();

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].start, date(2022, 1, 1));
        assert_eq!(windows[0].end, date(2022, 2, 1));
        assert_eq!(windows[2].start, date(2022, 3, 1));
        assert_eq!(windows[2].end, date(2022, 4, 1));
    }

    #[test]
    fn windows_cross_year_boundaries() {
        let windows = month_windows(date(2022, 11, 15), date(2023, 1, 1)).unwrap();
        let labels: Vec<String> = windows.iter().map(|w| w.to_string()).collect();
        assert_eq!(labels, vec!["2022-11", "2022-12", "2023-01"]);
        assert_eq!(windows[1].end, date(2023, 1, 1));
    }

    #[test]
    fn epoch_after_today_yields_no_windows() {
        assert!(month_windows(date(2024, 5, 1), date(2024, 4, 30)).unwrap().is_empty());
    }

    #[test]
    fn add_months_walks_calendar_months() {
        assert_eq!(add_months(date(2022, 1, 1), 0).unwrap(), date(2022, 1, 1));
        assert_eq!(add_months(date(2022, 1, 1), 13).unwrap(), date(2023, 2, 1));
        assert_eq!(add_months(date(2022, 1, 31), 1).unwrap(), date(2022, 2, 28));
    }

    #[test]
    fn window_contains_is_half_open() {
        let window = MonthWindow::containing(date(2022, 2, 10)).unwrap();
        assert!(window.contains(date(2022, 2, 1)));
        assert!(window.contains(date(2022, 2, 28)));
        assert!(!window.contains(date(2022, 3, 1)));
    }
}
