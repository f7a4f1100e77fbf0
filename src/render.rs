//! Terminal tables for every report the binary prints.

use analytics::{
    MonthlyAmount, PeriodicFinancialSnapshot, RetentionMatrix, RunwayEstimate, RunwayReport,
    SignupFunnelRow, Summary,
};
use chrono::NaiveDate;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use core_types::{BankTransaction, DirectCustomer, RevenueGranularity};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn number(value: impl ToString) -> Cell {
    Cell::new(value.to_string()).set_alignment(CellAlignment::Right)
}

pub fn money(amount: Decimal) -> String {
    format!("${}", amount.round_dp(2))
}

pub fn percent(ratio: Decimal) -> String {
    format!("{}%", (ratio * Decimal::ONE_HUNDRED).round_dp(1))
}

fn month(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

pub fn funnel_table(rows: &[SignupFunnelRow]) -> Table {
    let mut t = table(vec!["Month", "Finished signup", "Started signup", "Finished / started"]);
    for row in rows {
        t.add_row(vec![
            Cell::new(month(row.month)),
            number(row.num_finished_signup),
            number(row.num_started_signup),
            number(row.finished_ratio.map(percent).unwrap_or_else(|| "-".to_string())),
        ]);
    }
    t
}

/// One row per cohort, one column per month offset. Unrecorded months are blank.
pub fn retention_table(matrix: &RetentionMatrix) -> Table {
    let offsets: Vec<String> = (0..matrix.len()).map(|k| format!("+{k}")).collect();
    let mut header = vec!["Cohort", "Size"];
    header.extend(offsets.iter().map(String::as_str));

    let mut t = table(header);
    for row in matrix.rows() {
        let mut cells = vec![Cell::new(month(row.start_date)), number(row.initial_size)];
        cells.extend(
            row.counts
                .iter()
                .map(|count| number(count.map(|c| c.to_string()).unwrap_or_default())),
        );
        t.add_row(cells);
    }
    t
}

pub fn retention_view_table(offset: usize, view: &BTreeMap<NaiveDate, Decimal>) -> Table {
    let label = format!("Retained after {offset} month(s)");
    let mut t = table(vec!["Cohort", label.as_str()]);
    for (start, ratio) in view {
        t.add_row(vec![Cell::new(month(*start)), number(percent(*ratio))]);
    }
    t
}

pub fn revenue_table(series: &[PeriodicFinancialSnapshot], granularity: RevenueGranularity) -> Table {
    let billing = format!("Billing {granularity}");
    let direct = format!("Direct {granularity}");
    let total = format!("Total {granularity}");
    let mut t = table(vec![
        "Time",
        billing.as_str(),
        "Subscriptions",
        direct.as_str(),
        "Direct customers",
        total.as_str(),
    ]);
    for point in series {
        t.add_row(vec![
            Cell::new(point.time.format("%Y-%m-%d %H:%M")),
            number(money(point.recurring_revenue_from_billing)),
            number(point.active_subscription_count),
            number(money(point.recurring_revenue_from_direct_customers)),
            number(point.active_direct_customer_count),
            number(money(point.total_revenue)),
        ]);
    }
    t
}

pub fn direct_customers_table(customers: &[&DirectCustomer]) -> Table {
    let mut t = table(vec!["Customer", "Start", "End", "Monthly"]);
    for customer in customers {
        t.add_row(vec![
            Cell::new(&customer.name),
            Cell::new(customer.start_date.format("%Y-%m-%d")),
            Cell::new(customer.end_date.format("%Y-%m-%d")),
            number(money(customer.monthly_amount)),
        ]);
    }
    t
}

pub fn monthly_table(label: &str, amounts: &[MonthlyAmount]) -> Table {
    let mut t = table(vec!["Month", label]);
    for amount in amounts {
        t.add_row(vec![Cell::new(month(amount.month)), number(money(amount.amount))]);
    }
    t
}

pub fn transactions_table(transactions: &[&BankTransaction]) -> Table {
    let mut t = table(vec!["Posted", "Description", "Amount"]);
    for tx in transactions {
        t.add_row(vec![
            Cell::new(tx.posted_at_date),
            Cell::new(&tx.description),
            number(money(tx.amount)),
        ]);
    }
    t
}

fn summary_row(name: &str, summary: Option<Summary>) -> Vec<Cell> {
    match summary {
        Some(s) => vec![Cell::new(name), number(money(s.min)), number(money(s.mean)), number(money(s.max))],
        None => vec![Cell::new(name), number("-"), number("-"), number("-")],
    }
}

fn estimate_rows(t: &mut Table, kind: &str, estimates: Option<[RunwayEstimate; 3]>) {
    let labels = ["lowest", "highest", "average"];
    match estimates {
        Some(estimates) => {
            for (label, estimate) in labels.iter().zip(estimates) {
                t.add_row(vec![Cell::new(format!("{kind} burn ({label})")), Cell::new(estimate)]);
            }
        }
        None => {
            t.add_row(vec![Cell::new(format!("{kind} burn")), Cell::new("no data")]);
        }
    }
}

/// The runway section: monthly figures, the three default-alive scenarios and
/// the runway sentences.
pub fn runway_tables(report: &RunwayReport) -> Vec<Table> {
    let mut figures = table(vec!["Monthly", "Min", "Mean", "Max"]);
    figures.add_row(summary_row("Income", report.income));
    figures.add_row(summary_row("Gross burn", report.gross_burn));
    figures.add_row(summary_row("Net burn", report.net_burn));

    let mut position = table(vec!["Position", "Value"]);
    position.add_row(vec![Cell::new("Balance"), number(money(report.balance))]);
    position.add_row(vec![
        Cell::new("Current yearly salary"),
        number(report.current_yearly_salary.map(money).unwrap_or_else(|| "-".to_string())),
    ]);
    position.add_row(vec![Cell::new("Monthly salary adjustment"), number(money(report.salary_adjustment))]);

    let mut scenarios = table(vec!["Scenario", "Outcome"]);
    for (name, outcome) in [
        ("Worst case", report.worst_case),
        ("Average case", report.average_case),
        ("Best case", report.best_case),
    ] {
        let text = outcome.map(|o| o.to_string()).unwrap_or_else(|| "no data".to_string());
        scenarios.add_row(vec![Cell::new(name), Cell::new(text)]);
    }

    let mut runway = table(vec!["Burn", "Runway"]);
    estimate_rows(&mut runway, "Net", report.net_runway);
    estimate_rows(&mut runway, "Gross", report.gross_runway);

    vec![position, figures, scenarios, runway]
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytics::Cohort;
    use core_types::{MonthWindow, Profile};
    use rust_decimal_macros::dec;

    #[test]
    fn money_and_percent_formatting() {
        assert_eq!(money(dec!(1234.5678)), "$1234.57");
        assert_eq!(percent(dec!(0.5)), "50.0%");
        assert_eq!(percent(dec!(0.3333)), "33.3%");
    }

    #[test]
    fn funnel_shows_a_dash_for_empty_months() {
        let rendered = funnel_table(&[SignupFunnelRow {
            month: NaiveDate::from_ymd_opt(2022, 3, 1).unwrap(),
            num_finished_signup: 0,
            num_started_signup: 0,
            finished_ratio: None,
        }])
        .to_string();

        assert!(rendered.contains("2022-03"));
        assert!(rendered.contains(" - "));
    }

    #[test]
    fn retention_table_has_a_column_per_offset() {
        let window = MonthWindow::containing(NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()).unwrap();
        let users = vec![Profile::new("a", None)];
        let matrix = RetentionMatrix::from_cohorts(&[Cohort::new(window, users.clone(), users)]).unwrap();

        let rendered = retention_table(&matrix).to_string();
        assert!(rendered.contains("+0"));
        assert!(!rendered.contains("+1"));
    }
}
