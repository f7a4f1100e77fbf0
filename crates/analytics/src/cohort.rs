//! Monthly acquisition cohorts, the signup funnel and the retention matrix.

use crate::error::AnalyticsError;
use crate::report::{RetentionRow, SignupFunnelRow};
use chrono::{Datelike, Months, NaiveDate};
use core_types::{add_months, first_of_month, MonthWindow, Profile};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// The users belonging to one calendar month.
///
/// `finished_signup` is derived from `started_signup` at construction, so it
/// is always a subset of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CohortRecord", into = "CohortRecord")]
pub struct Cohort {
    window: MonthWindow,
    started_signup: HashSet<Profile>,
    finished_signup: HashSet<Profile>,
    did_any_event: HashSet<Profile>,
}

/// On-disk shape of a cohort. The derived set is not stored.
#[derive(Serialize, Deserialize)]
struct CohortRecord {
    window: MonthWindow,
    started_signup: Vec<Profile>,
    did_any_event: Vec<Profile>,
}

impl From<CohortRecord> for Cohort {
    fn from(record: CohortRecord) -> Self {
        Cohort::new(record.window, record.started_signup, record.did_any_event)
    }
}

impl From<Cohort> for CohortRecord {
    fn from(cohort: Cohort) -> Self {
        CohortRecord {
            window: cohort.window,
            started_signup: cohort.started_signup.into_iter().collect(),
            did_any_event: cohort.did_any_event.into_iter().collect(),
        }
    }
}

impl Cohort {
    /// # Arguments
    ///
    /// * `window` - The calendar month this cohort covers.
    /// * `started_signup` - Users first seen during the window.
    /// * `did_any_event` - Users, from the whole user base, active during the window.
    pub fn new(
        window: MonthWindow,
        started_signup: impl IntoIterator<Item = Profile>,
        did_any_event: impl IntoIterator<Item = Profile>,
    ) -> Self {
        let started_signup: HashSet<Profile> = started_signup.into_iter().collect();
        let finished_signup = started_signup
            .iter()
            .filter(|p| p.finished_signup())
            .cloned()
            .collect();

        Self {
            window,
            started_signup,
            finished_signup,
            did_any_event: did_any_event.into_iter().collect(),
        }
    }

    pub fn window(&self) -> MonthWindow {
        self.window
    }

    pub fn start_date(&self) -> NaiveDate {
        self.window.start
    }

    pub fn end_date(&self) -> NaiveDate {
        self.window.end
    }

    pub fn started_signup(&self) -> &HashSet<Profile> {
        &self.started_signup
    }

    pub fn finished_signup(&self) -> &HashSet<Profile> {
        &self.finished_signup
    }

    pub fn did_any_event(&self) -> &HashSet<Profile> {
        &self.did_any_event
    }

    /// How many of this cohort's initial members are in `active`.
    fn retained_in(&self, active: &HashSet<Profile>) -> u64 {
        self.started_signup.iter().filter(|p| active.contains(p)).count() as u64
    }

    pub fn funnel_row(&self) -> SignupFunnelRow {
        let started = self.started_signup.len() as u64;
        let finished = self.finished_signup.len() as u64;
        SignupFunnelRow {
            month: self.window.start,
            num_finished_signup: finished,
            num_started_signup: started,
            finished_ratio: ratio(finished, started),
        }
    }
}

/// `numerator / denominator`, or `None` when the denominator is zero.
fn ratio(numerator: u64, denominator: u64) -> Option<Decimal> {
    (denominator > 0).then(|| Decimal::from(numerator) / Decimal::from(denominator))
}

/// The signup funnel, one row per cohort in cohort order.
pub fn signup_funnel(cohorts: &[Cohort]) -> Vec<SignupFunnelRow> {
    cohorts.iter().map(Cohort::funnel_row).collect()
}

/// Number of calendar months from `from` to `to`; negative when `to` is earlier.
fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to.year() as i64 * 12 + to.month0() as i64) - (from.year() as i64 * 12 + from.month0() as i64)
}

/// Cohort-by-offset retention counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionMatrix {
    rows: Vec<RetentionRow>,
}

impl RetentionMatrix {
    /// Builds the matrix from chronologically ordered cohorts.
    ///
    /// For every row and every offset `k` in `0..cohorts.len()`, the target month
    /// is found by walking `k` months forward from the row's start date and then
    /// looked up by date among the cohorts. Months that are not recorded produce
    /// an absent cell rather than a zero.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if two cohorts share a start month, `Calendar` if the month
    /// walk leaves the supported date range.
    pub fn from_cohorts(cohorts: &[Cohort]) -> Result<Self, AnalyticsError> {
        let mut by_start: HashMap<NaiveDate, &Cohort> = HashMap::with_capacity(cohorts.len());
        for cohort in cohorts {
            if by_start.insert(cohort.start_date(), cohort).is_some() {
                return Err(AnalyticsError::InvalidInput(format!(
                    "duplicate cohort for {}",
                    cohort.window()
                )));
            }
        }

        let width = cohorts.len();
        let mut rows = Vec::with_capacity(width);

        for cohort in cohorts {
            let mut counts = Vec::with_capacity(width);
            for offset in 0..width {
                let target = add_months(cohort.start_date(), offset as u32)?;
                counts.push(by_start.get(&target).map(|t| cohort.retained_in(&t.did_any_event)));
            }

            tracing::debug!(cohort = %cohort.window(), size = cohort.started_signup.len(), "Built retention row.");
            rows.push(RetentionRow {
                start_date: cohort.start_date(),
                end_date: cohort.end_date(),
                initial_size: cohort.started_signup.len() as u64,
                counts,
            });
        }

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[RetentionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Retention of cohort `row` in the calendar month containing `month`.
    ///
    /// Months before the cohort existed are always `Some(0)`. Months that are
    /// not recorded are `None`.
    pub fn count_at(&self, row: usize, month: NaiveDate) -> Option<u64> {
        let row = self.rows.get(row)?;
        let offset = months_between(row.start_date, first_of_month(month));
        if offset < 0 {
            return Some(0);
        }
        row.count_at_offset(offset as usize)
    }

    /// Fraction of each cohort still active `offset` months after it started,
    /// keyed by cohort start date.
    ///
    /// Cohorts whose target month is not recorded, and empty cohorts, are left out.
    pub fn retention_at_offset(&self, offset: usize) -> BTreeMap<NaiveDate, Decimal> {
        self.rows
            .iter()
            .filter_map(|row| {
                let count = row.count_at_offset(offset)?;
                Some((row.start_date, ratio(count, row.initial_size)?))
            })
            .collect()
    }

    /// Same as [`Self::retention_at_offset`], restricted to cohorts that started
    /// within the last `months` calendar months before `today`.
    pub fn recent_retention_at_offset(
        &self,
        offset: usize,
        today: NaiveDate,
        months: u32,
    ) -> BTreeMap<NaiveDate, Decimal> {
        let cutoff = first_of_month(today)
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN);

        let mut view = self.retention_at_offset(offset);
        view.retain(|start, _| *start >= cutoff);
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn month(y: i32, m: u32) -> MonthWindow {
        MonthWindow::containing(NaiveDate::from_ymd_opt(y, m, 1).unwrap()).unwrap()
    }

    fn users(prefix: &str, n: usize, with_email: usize) -> Vec<Profile> {
        (0..n)
            .map(|i| {
                let email = (i < with_email).then(|| format!("{prefix}{i}@example.com"));
                Profile::new(format!("{prefix}{i}"), email)
            })
            .collect()
    }

    #[test]
    fn finished_signup_is_derived_from_started() {
        let cohort = Cohort::new(month(2022, 1), users("a", 10, 4), Vec::new());
        assert_eq!(cohort.started_signup().len(), 10);
        assert_eq!(cohort.finished_signup().len(), 4);
        assert!(cohort.finished_signup().is_subset(cohort.started_signup()));
    }

    #[test]
    fn funnel_ratio_is_none_for_empty_month() {
        let cohorts = vec![
            Cohort::new(month(2022, 1), users("a", 4, 1), Vec::new()),
            Cohort::new(month(2022, 2), Vec::new(), Vec::new()),
        ];
        let funnel = signup_funnel(&cohorts);

        assert_eq!(funnel[0].finished_ratio, Some(dec!(0.25)));
        assert_eq!(funnel[1].num_started_signup, 0);
        assert_eq!(funnel[1].finished_ratio, None);
    }

    #[test]
    fn offsets_are_relative_to_the_cohort() {
        let jan = users("a", 4, 0);
        let feb = users("b", 2, 0);
        let cohorts = vec![
            Cohort::new(month(2022, 1), jan.clone(), jan.clone()),
            Cohort::new(month(2022, 2), feb.clone(), vec![jan[0].clone(), feb[0].clone()]),
        ];
        let matrix = RetentionMatrix::from_cohorts(&cohorts).unwrap();

        assert_eq!(matrix.rows()[0].counts, vec![Some(4), Some(1)]);
        // February's offset 0 is February itself, offset 1 (March) is not recorded.
        assert_eq!(matrix.rows()[1].counts, vec![Some(1), None]);
    }

    #[test]
    fn gaps_in_the_windows_are_absent_not_zero() {
        let a = users("a", 2, 0);
        let cohorts = vec![
            Cohort::new(month(2022, 1), a.clone(), a.clone()),
            Cohort::new(month(2022, 3), Vec::new(), a.clone()),
        ];
        let matrix = RetentionMatrix::from_cohorts(&cohorts).unwrap();

        // Offset 1 is February, which has no window.
        assert_eq!(matrix.rows()[0].counts, vec![Some(2), None]);
        assert_eq!(matrix.count_at(0, NaiveDate::from_ymd_opt(2022, 3, 9).unwrap()), None);
    }

    #[test]
    fn months_before_the_cohort_count_zero() {
        let a = users("a", 3, 0);
        let b = users("b", 3, 0);
        let cohorts = vec![
            Cohort::new(month(2022, 1), a.clone(), b.clone()),
            Cohort::new(month(2022, 2), b.clone(), b.clone()),
        ];
        let matrix = RetentionMatrix::from_cohorts(&cohorts).unwrap();

        for (row, cohort) in cohorts.iter().enumerate() {
            for window in cohorts.iter().filter(|w| w.start_date() < cohort.start_date()) {
                assert_eq!(matrix.count_at(row, window.start_date()), Some(0));
            }
        }
        assert_eq!(matrix.count_at(1, NaiveDate::from_ymd_opt(2022, 2, 1).unwrap()), Some(3));
    }

    #[test]
    fn duplicate_months_are_rejected() {
        let cohorts = vec![
            Cohort::new(month(2022, 1), Vec::new(), Vec::new()),
            Cohort::new(month(2022, 1), Vec::new(), Vec::new()),
        ];
        assert!(matches!(
            RetentionMatrix::from_cohorts(&cohorts),
            Err(AnalyticsError::InvalidInput(_))
        ));
    }

    #[test]
    fn percentage_view_skips_empty_and_unrecorded_cohorts() {
        let a = users("a", 4, 0);
        let cohorts = vec![
            Cohort::new(month(2022, 1), a.clone(), a.clone()),
            Cohort::new(month(2022, 2), Vec::new(), a[..1].to_vec()),
            Cohort::new(month(2022, 3), users("c", 5, 0), Vec::new()),
        ];
        let matrix = RetentionMatrix::from_cohorts(&cohorts).unwrap();

        let at_one = matrix.retention_at_offset(1);
        assert_eq!(at_one.len(), 1);
        assert_eq!(at_one[&NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()], dec!(0.25));

        let at_zero = matrix.retention_at_offset(0);
        assert_eq!(at_zero.len(), 2);
        assert_eq!(at_zero[&NaiveDate::from_ymd_opt(2022, 3, 1).unwrap()], Decimal::ZERO);
    }

    #[test]
    fn recent_view_limits_to_trailing_months() {
        let cohorts: Vec<Cohort> = (1..=6)
            .map(|m| {
                let u = users(&format!("m{m}"), 2, 0);
                Cohort::new(month(2022, m), u.clone(), u)
            })
            .collect();
        let matrix = RetentionMatrix::from_cohorts(&cohorts).unwrap();
        let today = NaiveDate::from_ymd_opt(2022, 6, 20).unwrap();

        let recent = matrix.recent_retention_at_offset(0, today, 2);
        let starts: Vec<u32> = recent.keys().map(|d| d.month()).collect();
        assert_eq!(starts, vec![4, 5, 6]);
    }

    #[test]
    fn cohorts_survive_a_json_round_trip() {
        let cohort = Cohort::new(month(2022, 1), users("a", 3, 2), users("a", 1, 0));
        let json = serde_json::to_string(&cohort).unwrap();
        let back: Cohort = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cohort);
        assert_eq!(back.finished_signup().len(), 2);
    }
}
