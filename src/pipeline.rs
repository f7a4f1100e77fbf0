//! Glue between the collectors, the models and the configuration.

use analytics::{CashflowRules, Cohort, RunwayAssumptions};
use api_client::{cached, ApiError, ProfileSource};
use chrono::NaiveDate;
use configuration::{CacheConfig, CashflowSettings, CohortSettings, RunwaySettings};
use core_types::{month_windows, CollectorKind, MonthWindow};
use indicatif::ProgressStyle;
use tracing::Span;
use tracing_indicatif::span_ext::IndicatifSpanExt;

pub fn cashflow_rules(settings: &CashflowSettings) -> CashflowRules {
    CashflowRules {
        income_since: settings.income_since,
        payroll_marker: settings.payroll_marker.clone(),
        billing_payout_marker: settings.billing_payout_marker.clone(),
    }
}

pub fn runway_assumptions(settings: &RunwaySettings) -> RunwayAssumptions {
    RunwayAssumptions {
        number_months: settings.number_months,
        monthly_revenue_growth_rate: settings.monthly_revenue_growth_rate,
        payroll_headcount: settings.payroll_headcount,
        new_yearly_salary: settings.new_yearly_salary,
        max_months: settings.max_months,
    }
}

/// Builds one cohort per window, asking the source two questions per month.
/// Windows are queried one after another, in order.
#[tracing::instrument(skip_all, fields(windows = windows.len()))]
pub async fn build_cohorts(source: &dyn ProfileSource, windows: &[MonthWindow]) -> Result<Vec<Cohort>, ApiError> {
    let span = Span::current();
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        span.pb_set_style(&style.progress_chars("#>-"));
    }
    span.pb_set_length(windows.len() as u64);

    let mut cohorts = Vec::with_capacity(windows.len());
    for window in windows {
        span.pb_set_message(&format!("Querying {window}"));

        let started = source.first_seen(window).await?;
        let active = source.active(window).await?;
        tracing::debug!(month = %window, started = started.len(), active = active.len(), "Cohort collected.");

        cohorts.push(Cohort::new(*window, started, active));
        span.pb_inc(1);
    }

    tracing::info!(cohorts = cohorts.len(), "Cohorts built.");
    Ok(cohorts)
}

/// Cohorts from the configured epoch through the month containing `today`,
/// served from the signups cache file when allowed.
pub async fn collect_cohorts(
    source: &dyn ProfileSource,
    settings: &CohortSettings,
    cache: &CacheConfig,
    today: NaiveDate,
) -> anyhow::Result<Vec<Cohort>> {
    let windows = month_windows(settings.epoch, today)?;
    let cohorts = cached(cache, CollectorKind::Signups, || build_cohorts(source, &windows)).await?;
    Ok(cohorts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytics::{signup_funnel, RetentionMatrix};
    use async_trait::async_trait;
    use core_types::Profile;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves fixed profile lists per month and counts the queries it gets.
    #[derive(Default)]
    struct FakeProfiles {
        first_seen: HashMap<NaiveDate, Vec<Profile>>,
        active: HashMap<NaiveDate, Vec<Profile>>,
        queries: AtomicUsize,
    }

    #[async_trait]
    impl ProfileSource for FakeProfiles {
        async fn first_seen(&self, window: &MonthWindow) -> Result<Vec<Profile>, ApiError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(self.first_seen.get(&window.start).cloned().unwrap_or_default())
        }

        async fn active(&self, window: &MonthWindow) -> Result<Vec<Profile>, ApiError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(self.active.get(&window.start).cloned().unwrap_or_default())
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn users(prefix: &str, n: usize, with_email: usize) -> Vec<Profile> {
        (0..n)
            .map(|i| {
                let email = (i < with_email).then(|| format!("{prefix}{i}@example.com"));
                Profile::new(format!("{prefix}{i}"), email)
            })
            .collect()
    }

    fn fake() -> FakeProfiles {
        let jan = users("jan", 4, 3);
        let feb = users("feb", 2, 0);
        let mut source = FakeProfiles::default();
        source.first_seen.insert(day(2022, 1, 1), jan.clone());
        source.first_seen.insert(day(2022, 2, 1), feb.clone());
        source.active.insert(day(2022, 1, 1), jan.clone());
        source.active.insert(day(2022, 2, 1), jan[..2].iter().cloned().chain(feb).collect());
        source
    }

    fn settings() -> CohortSettings {
        CohortSettings {
            epoch: day(2022, 1, 1),
            ..CohortSettings::default()
        }
    }

    #[tokio::test]
    async fn cohorts_cover_epoch_through_current_month() {
        let source = fake();
        let cohorts = collect_cohorts(&source, &settings(), &CacheConfig::default(), day(2022, 3, 10))
            .await
            .unwrap();

        assert_eq!(cohorts.len(), 3);
        assert_eq!(source.queries.load(Ordering::SeqCst), 6);

        let funnel = signup_funnel(&cohorts);
        assert_eq!(funnel[0].num_started_signup, 4);
        assert_eq!(funnel[0].num_finished_signup, 3);
        assert_eq!(funnel[2].finished_ratio, None);

        let matrix = RetentionMatrix::from_cohorts(&cohorts).unwrap();
        assert_eq!(matrix.rows()[0].counts, vec![Some(4), Some(2), Some(0)]);
    }

    #[tokio::test]
    async fn cached_cohorts_skip_the_collector() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheConfig {
            cache_dir: Some(dir.path().to_path_buf()),
            force_refresh: false,
        };

        let first = fake();
        let built = collect_cohorts(&first, &settings(), &cache, day(2022, 2, 1)).await.unwrap();
        assert_eq!(first.queries.load(Ordering::SeqCst), 4);

        let second = fake();
        let reloaded = collect_cohorts(&second, &settings(), &cache, day(2022, 2, 1)).await.unwrap();
        assert_eq!(second.queries.load(Ordering::SeqCst), 0);
        assert_eq!(signup_funnel(&reloaded), signup_funnel(&built));
    }
}
