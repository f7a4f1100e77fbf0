use analytics::{
    assess_runway, billing_payouts, current_direct_customers, monthly_expenses, monthly_income,
    monthly_payroll, revenue_series, signup_funnel, RetentionMatrix,
};
use anyhow::Context;
use api_client::{
    cached, BankingClient, BillingClient, ProductAnalyticsClient, SubscriptionSource,
    TransactionSource,
};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use configuration::settings::Settings;
use configuration::{init_logging, load_config, ChainedCredentials, RunwayOverrides};
use core_types::{AccountStatement, BankTransaction, CollectorKind, DirectCustomer, RevenueGranularity, Subscription};
use database::{collector_target, direct_customers_target, Warehouse};
use std::path::PathBuf;

mod pipeline;
mod render;

/// The main entry point for the Pulse metrics pipeline.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Credentials may live in a .env file; it is optional.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let settings = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    let _log_guard = init_logging(&settings.logging)?;
    let credentials = ChainedCredentials::standard(&settings.secrets.path)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Sync(args) => handle_sync(args, &settings, &credentials).await,
        Commands::Revenue(args) => handle_revenue(args, &settings, &credentials).await,
        Commands::Cashflow => handle_cashflow(&settings, &credentials).await,
        Commands::Runway(overrides) => handle_runway(overrides, &settings, &credentials).await,
        Commands::Cohorts(args) => handle_cohorts(args, &settings, &credentials).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Company metrics: cohorts, revenue, cash flow and runway.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of ./pulse.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull data from a collector and load it into the warehouse.
    Sync(SyncArgs),
    /// Recurring revenue over the trailing window, from the warehouse.
    Revenue(RevenueArgs),
    /// Monthly income, expenses and payroll, from the warehouse.
    Cashflow,
    /// Burn, runway and default-alive scenarios, from the warehouse.
    Runway(RunwayOverrides),
    /// Signup funnel and retention by monthly cohort.
    Cohorts(CohortArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SyncSource {
    Banking,
    Statements,
    Subscriptions,
    Signups,
    All,
}

#[derive(Args)]
struct SyncArgs {
    #[arg(value_enum)]
    source: SyncSource,

    /// Ignore cache files and call the collector.
    #[arg(long)]
    refresh: bool,
}

#[derive(Args)]
struct RevenueArgs {
    /// Annualize (ARR) instead of monthly (MRR).
    #[arg(long)]
    arr: bool,
}

#[derive(Args)]
struct CohortArgs {
    /// Month offset for the retention percentage views.
    #[arg(long)]
    offset: Option<usize>,

    /// Number of trailing months in the recent retention view.
    #[arg(long)]
    recent: Option<u32>,

    /// Ignore the cache file and query the collector.
    #[arg(long)]
    refresh: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn open_warehouse(settings: &Settings, credentials: &ChainedCredentials) -> anyhow::Result<Warehouse> {
    let pool = database::connect(&settings.warehouse, credentials)
        .await
        .context("Failed to connect to the warehouse")?;
    Ok(Warehouse::new(pool))
}

/// Fetches from each requested collector (or its cache file) and replaces the
/// corresponding warehouse table.
async fn handle_sync(args: SyncArgs, settings: &Settings, credentials: &ChainedCredentials) -> anyhow::Result<()> {
    let sources = match args.source {
        SyncSource::All => vec![
            SyncSource::Banking,
            SyncSource::Statements,
            SyncSource::Subscriptions,
            SyncSource::Signups,
        ],
        single => vec![single],
    };

    let cache = settings.cache.refreshing(args.refresh || settings.cache.force_refresh);
    let warehouse = open_warehouse(settings, credentials).await?;
    let wh = &settings.warehouse;

    for source in sources {
        tracing::info!(?source, "Syncing.");
        let written = match source {
            SyncSource::Banking => {
                let client = BankingClient::new(&settings.collectors, credentials)?;
                let txs: Vec<BankTransaction> =
                    cached(&cache, CollectorKind::BankTransactions, || client.fetch_transactions()).await?;
                warehouse
                    .write_records(&collector_target(wh, CollectorKind::BankTransactions), &txs, true)
                    .await?
            }
            SyncSource::Statements => {
                let client = BankingClient::new(&settings.collectors, credentials)?;
                let statements: Vec<AccountStatement> =
                    cached(&cache, CollectorKind::AccountStatements, || client.fetch_statements()).await?;
                warehouse
                    .write_records(&collector_target(wh, CollectorKind::AccountStatements), &statements, true)
                    .await?
            }
            SyncSource::Subscriptions => {
                let client = BillingClient::new(&settings.collectors, credentials)?;
                let subs: Vec<Subscription> =
                    cached(&cache, CollectorKind::Subscriptions, || client.fetch_subscriptions()).await?;
                warehouse
                    .write_records(&collector_target(wh, CollectorKind::Subscriptions), &subs, true)
                    .await?
            }
            SyncSource::Signups => {
                let client = ProductAnalyticsClient::new(&settings.collectors, credentials)?;
                let today = Utc::now().date_naive();
                let cohorts = pipeline::collect_cohorts(&client, &settings.cohorts, &cache, today).await?;
                warehouse
                    .write_records(&collector_target(wh, CollectorKind::Signups), &signup_funnel(&cohorts), true)
                    .await?
            }
            SyncSource::All => 0,
        };
        println!("{source:?}: wrote {written} rows.");
    }

    Ok(())
}

async fn handle_revenue(args: RevenueArgs, settings: &Settings, credentials: &ChainedCredentials) -> anyhow::Result<()> {
    let warehouse = open_warehouse(settings, credentials).await?;
    let subscriptions: Vec<Subscription> = warehouse
        .read_records(&collector_target(&settings.warehouse, CollectorKind::Subscriptions))
        .await
        .context("Failed to read subscriptions")?;
    let customers: Vec<DirectCustomer> = warehouse
        .read_records(&direct_customers_target(&settings.warehouse))
        .await
        .context("Failed to read direct customers")?;

    let granularity = if args.arr {
        RevenueGranularity::Arr
    } else {
        settings.revenue.granularity
    };
    let now = Utc::now();
    let trailing = chrono::Duration::try_weeks(settings.revenue.trailing_weeks)
        .context("revenue.trailing_weeks is out of range")?;
    let series = revenue_series(&subscriptions, &customers, granularity, now, trailing);

    println!("{}", render::revenue_table(&series, granularity));
    println!("Current direct customers");
    println!("{}", render::direct_customers_table(&current_direct_customers(&customers, now)));
    Ok(())
}

async fn handle_cashflow(settings: &Settings, credentials: &ChainedCredentials) -> anyhow::Result<()> {
    let warehouse = open_warehouse(settings, credentials).await?;
    let txs: Vec<BankTransaction> = warehouse
        .read_records(&collector_target(&settings.warehouse, CollectorKind::BankTransactions))
        .await
        .context("Failed to read bank transactions")?;
    let rules = pipeline::cashflow_rules(&settings.cashflow);

    println!("{}", render::monthly_table("Income", &monthly_income(&txs, rules.income_since)));
    println!("{}", render::monthly_table("Expenses", &monthly_expenses(&txs)));
    println!("{}", render::monthly_table("Payroll", &monthly_payroll(&txs, &rules.payroll_marker)));
    println!("Billing payouts");
    println!("{}", render::transactions_table(&billing_payouts(&txs, &rules.billing_payout_marker)));
    Ok(())
}

async fn handle_runway(
    overrides: RunwayOverrides,
    settings: &Settings,
    credentials: &ChainedCredentials,
) -> anyhow::Result<()> {
    let runway_settings = settings.runway.with_overrides(&overrides);
    let assumptions = pipeline::runway_assumptions(&runway_settings);
    let rules = pipeline::cashflow_rules(&settings.cashflow);

    let warehouse = open_warehouse(settings, credentials).await?;
    let txs: Vec<BankTransaction> = warehouse
        .read_records(&collector_target(&settings.warehouse, CollectorKind::BankTransactions))
        .await
        .context("Failed to read bank transactions")?;
    let statements: Vec<AccountStatement> = warehouse
        .read_records(&collector_target(&settings.warehouse, CollectorKind::AccountStatements))
        .await
        .context("Failed to read account statements")?;

    let report = assess_runway(&txs, &statements, &rules, &assumptions)?;
    for table in render::runway_tables(&report) {
        println!("{table}");
    }
    Ok(())
}

async fn handle_cohorts(args: CohortArgs, settings: &Settings, credentials: &ChainedCredentials) -> anyhow::Result<()> {
    let client = ProductAnalyticsClient::new(&settings.collectors, credentials)?;
    let cache = settings.cache.refreshing(args.refresh || settings.cache.force_refresh);
    let today = Utc::now().date_naive();

    let cohorts = pipeline::collect_cohorts(&client, &settings.cohorts, &cache, today).await?;
    let matrix = RetentionMatrix::from_cohorts(&cohorts)?;
    let offset = args.offset.unwrap_or(settings.cohorts.retention_offset);
    let recent = args.recent.unwrap_or(settings.cohorts.recent_months);

    println!("Signup funnel");
    println!("{}", render::funnel_table(&signup_funnel(&cohorts)));
    println!("Retention by cohort");
    println!("{}", render::retention_table(&matrix));
    println!("All cohorts");
    println!("{}", render::retention_view_table(offset, &matrix.retention_at_offset(offset)));
    println!("Cohorts from the last {recent} months");
    println!(
        "{}",
        render::retention_view_table(offset, &matrix.recent_retention_at_offset(offset, today, recent))
    );
    Ok(())
}
