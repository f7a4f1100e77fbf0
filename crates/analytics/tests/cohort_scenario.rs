use analytics::{signup_funnel, Cohort, RetentionMatrix};
use chrono::NaiveDate;
use core_types::{month_windows, Profile};

fn members(prefix: &str, n: usize) -> Vec<Profile> {
    (0..n)
        .map(|i| Profile::new(format!("{prefix}-{i}"), (i % 2 == 0).then(|| format!("{prefix}{i}@example.com"))))
        .collect()
}

/// Three cohorts of 10, 20 and 30 users. All of January's users are active in
/// January, half of them come back in February.
fn three_cohorts() -> Vec<Cohort> {
    let windows = month_windows(
        NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2022, 3, 15).unwrap(),
    )
    .unwrap();
    assert_eq!(windows.len(), 3);

    let jan = members("jan", 10);
    let feb = members("feb", 20);
    let mar = members("mar", 30);

    let feb_active: Vec<Profile> = jan[..5].iter().chain(feb.iter()).cloned().collect();
    let mar_active: Vec<Profile> = jan[..2].iter().chain(feb[..10].iter()).chain(mar.iter()).cloned().collect();

    vec![
        Cohort::new(windows[0], jan.clone(), jan),
        Cohort::new(windows[1], feb, feb_active),
        Cohort::new(windows[2], mar, mar_active),
    ]
}

#[test]
fn first_cohort_retention_row() {
    let matrix = RetentionMatrix::from_cohorts(&three_cohorts()).unwrap();
    let first = &matrix.rows()[0];

    assert_eq!(first.initial_size, 10);
    assert_eq!(first.counts, vec![Some(10), Some(5), Some(2)]);
}

#[test]
fn later_cohorts_only_have_offsets_that_exist() {
    let matrix = RetentionMatrix::from_cohorts(&three_cohorts()).unwrap();

    assert_eq!(matrix.rows()[1].counts, vec![Some(20), Some(10), None]);
    assert_eq!(matrix.rows()[2].counts, vec![Some(30), None, None]);
    assert_eq!(matrix.len(), 3);
}

#[test]
fn matrix_is_lower_triangular_zero() {
    let cohorts = three_cohorts();
    let matrix = RetentionMatrix::from_cohorts(&cohorts).unwrap();

    for (row, cohort) in cohorts.iter().enumerate() {
        for window in &cohorts {
            if window.start_date() < cohort.start_date() {
                assert_eq!(matrix.count_at(row, window.start_date()), Some(0));
            }
        }
    }
}

#[test]
fn funnel_never_has_more_finished_than_started() {
    let funnel = signup_funnel(&three_cohorts());

    assert_eq!(funnel.len(), 3);
    for row in &funnel {
        assert!(row.num_finished_signup <= row.num_started_signup);
    }
    assert_eq!(funnel[0].num_finished_signup, 5);
    assert_eq!(funnel[0].num_started_signup, 10);
}
