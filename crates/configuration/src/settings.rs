use chrono::NaiveDate;
use core_types::RevenueGranularity;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an empty `pulse.toml` (or none at all) is a
/// valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub cohorts: CohortSettings,
    pub revenue: RevenueSettings,
    pub cashflow: CashflowSettings,
    pub runway: RunwaySettings,
    pub cache: CacheConfig,
    pub collectors: CollectorSettings,
    pub warehouse: WarehouseSettings,
    pub logging: LoggingConfig,
    pub secrets: SecretsSettings,
}

/// Parameters of the monthly cohort model.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CohortSettings {
    /// The first month cohorts are built for.
    pub epoch: NaiveDate,
    /// How many trailing months the "recent" retention view shows.
    pub recent_months: u32,
    /// The default month offset for the retention percentage view.
    pub retention_offset: usize,
}

impl Default for CohortSettings {
    fn default() -> Self {
        Self {
            epoch: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap_or(NaiveDate::MIN),
            recent_months: 6,
            retention_offset: 1,
        }
    }
}

/// Parameters of the recurring revenue series.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RevenueSettings {
    /// Length of the trailing window, in weeks.
    pub trailing_weeks: i64,
    /// `"MRR"` or `"ARR"`. `pulse revenue --arr` forces ARR.
    pub granularity: RevenueGranularity,
}

impl Default for RevenueSettings {
    fn default() -> Self {
        Self {
            trailing_weeks: 52,
            granularity: RevenueGranularity::Mrr,
        }
    }
}

/// How bank transactions are classified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CashflowSettings {
    /// Inflows before this date (fundraising) are not income.
    pub income_since: NaiveDate,
    /// Substring of the payroll provider's debit description.
    pub payroll_marker: String,
    /// Exact description of billing-platform payouts.
    pub billing_payout_marker: String,
}

impl Default for CashflowSettings {
    fn default() -> Self {
        Self {
            income_since: NaiveDate::from_ymd_opt(2022, 10, 1).unwrap_or(NaiveDate::MIN),
            payroll_marker: "RIPPLING".to_string(),
            billing_payout_marker: "STRIPE - TRANSFER".to_string(),
        }
    }
}

/// Assumptions for the runway and default-alive projections.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunwaySettings {
    /// Number of recent months of burn to consider (1..=12).
    pub number_months: usize,
    /// Fractional monthly revenue growth. 0.25 corresponds to 25%.
    pub monthly_revenue_growth_rate: Decimal,
    /// Headcount the latest payroll month is divided across.
    pub payroll_headcount: u32,
    /// Planned yearly salary per head. Unset means "keep the current one".
    pub new_yearly_salary: Option<Decimal>,
    /// Cap on simulated months before giving up.
    pub max_months: u32,
}

impl Default for RunwaySettings {
    fn default() -> Self {
        Self {
            number_months: 1,
            monthly_revenue_growth_rate: Decimal::new(25, 2),
            payroll_headcount: 3,
            new_yearly_salary: None,
            max_months: 1200,
        }
    }
}

/// Command-line overrides for [`RunwaySettings`].
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct RunwayOverrides {
    /// Number of recent months to consider (1-12).
    #[cfg_attr(feature = "clap", arg(long))]
    pub months: Option<usize>,

    /// Monthly revenue growth as a fraction (e.g. 0.25).
    #[cfg_attr(feature = "clap", arg(long))]
    pub growth: Option<Decimal>,

    /// Planned yearly salary per head.
    #[cfg_attr(feature = "clap", arg(long))]
    pub salary: Option<Decimal>,
}

impl RunwaySettings {
    /// Returns a copy with any provided overrides applied.
    pub fn with_overrides(&self, overrides: &RunwayOverrides) -> Self {
        Self {
            number_months: overrides.months.unwrap_or(self.number_months),
            monthly_revenue_growth_rate: overrides.growth.unwrap_or(self.monthly_revenue_growth_rate),
            new_yearly_salary: overrides.salary.or(self.new_yearly_salary),
            ..self.clone()
        }
    }
}

/// Where collector output is cached between runs.
///
/// A cached result is used when `cache_dir` is set, the collector's file
/// exists in it, and `force_refresh` is false.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub cache_dir: Option<PathBuf>,
    pub force_refresh: bool,
}

impl CacheConfig {
    /// The same cache location, with refreshing forced on or off.
    pub fn refreshing(&self, force_refresh: bool) -> Self {
        Self {
            cache_dir: self.cache_dir.clone(),
            force_refresh,
        }
    }
}

/// Connection parameters for the three external collectors.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorSettings {
    pub banking_base_url: String,
    pub billing_base_url: String,
    pub product_analytics_base_url: String,
    /// Page size requested from the billing platform.
    pub page_size: u32,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            banking_base_url: "https://platform.brexapis.com/v2".to_string(),
            billing_base_url: "https://api.stripe.com/v1".to_string(),
            product_analytics_base_url: "https://mixpanel.com/api/2.0".to_string(),
            page_size: 100,
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }
}

/// Bounded retry for transient collector failures.
///
/// The default of a single attempt means failures are not retried.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for every further attempt.
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// The warehouse the flattened tables are written to and read from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WarehouseSettings {
    /// Logical warehouse name, recorded with every destination.
    pub name: String,
    /// Database holding the dashboard schemas.
    pub database: String,
    /// Maximum pooled connections.
    pub max_connections: u32,
}

impl Default for WarehouseSettings {
    fn default() -> Self {
        Self {
            name: "COMPUTE_WH".to_string(),
            database: "DASHBOARD_DATA".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive, used when `RUST_LOG` is not set.
    pub level: String,
    /// If set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "pulse.log".to_string(),
        }
    }
}

/// Location of the host secret-store file consulted after the environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecretsSettings {
    pub path: PathBuf,
}

impl Default for SecretsSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".secrets.toml"),
        }
    }
}
