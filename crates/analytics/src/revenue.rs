//! Recurring revenue over a trailing window.

use crate::report::PeriodicFinancialSnapshot;
use chrono::{DateTime, Duration, Months, NaiveTime, Utc};
use core_types::{first_of_month, DirectCustomer, RevenueGranularity, Subscription};
use rust_decimal::Decimal;

/// Monthly revenue and counts of everything active at `t`.
pub fn snapshot_at(
    subscriptions: &[Subscription],
    customers: &[DirectCustomer],
    t: DateTime<Utc>,
) -> PeriodicFinancialSnapshot {
    let (billing_revenue, subscription_count) = subscriptions
        .iter()
        .filter(|s| s.is_active_at(t))
        .fold((Decimal::ZERO, 0u64), |(sum, n), s| (sum + s.amount, n + 1));

    let (direct_revenue, customer_count) = customers
        .iter()
        .filter(|c| c.is_active_at(t))
        .fold((Decimal::ZERO, 0u64), |(sum, n), c| (sum + c.monthly_amount, n + 1));

    PeriodicFinancialSnapshot {
        time: t,
        recurring_revenue_from_billing: billing_revenue,
        active_subscription_count: subscription_count,
        recurring_revenue_from_direct_customers: direct_revenue,
        active_direct_customer_count: customer_count,
        total_revenue: billing_revenue + direct_revenue,
    }
}

/// The instants the revenue series is sampled at: midnight UTC on the first of
/// every month inside `[now - trailing, now]`, followed by `now` itself unless
/// `now` already is one of those month boundaries.
pub fn sample_times(now: DateTime<Utc>, trailing: Duration) -> Vec<DateTime<Utc>> {
    let start = now - trailing;
    let mut current = first_of_month(start.date_naive())
        .and_time(NaiveTime::MIN)
        .and_utc();
    if current < start {
        current = match current.checked_add_months(Months::new(1)) {
            Some(next) => next,
            None => return vec![now],
        };
    }

    let mut times = Vec::new();
    while current <= now {
        times.push(current);
        match current.checked_add_months(Months::new(1)) {
            Some(next) => current = next,
            None => break,
        }
    }

    if times.last() != Some(&now) {
        times.push(now);
    }
    times
}

/// Builds the revenue series over the trailing window ending at `now`.
///
/// Every point is computed monthly first; for `Arr` each revenue field,
/// including the total, is then multiplied by 12.
pub fn revenue_series(
    subscriptions: &[Subscription],
    customers: &[DirectCustomer],
    granularity: RevenueGranularity,
    now: DateTime<Utc>,
    trailing: Duration,
) -> Vec<PeriodicFinancialSnapshot> {
    let factor = granularity.multiplier();
    sample_times(now, trailing)
        .into_iter()
        .map(|t| snapshot_at(subscriptions, customers, t).scaled(factor))
        .collect()
}

/// Direct customers whose contract has not ended as of `now`.
pub fn current_direct_customers(customers: &[DirectCustomer], now: DateTime<Utc>) -> Vec<&DirectCustomer> {
    customers.iter().filter(|c| c.end_date >= now).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn fixtures() -> (Vec<Subscription>, Vec<DirectCustomer>) {
        let subscriptions = vec![
            Subscription { id: "s1".into(), start_date: at(2023, 1, 15), end_date: None, amount: dec!(20) },
            Subscription { id: "s2".into(), start_date: at(2023, 2, 15), end_date: Some(at(2023, 4, 1)), amount: dec!(50) },
        ];
        let customers = vec![DirectCustomer {
            name: "Acme".into(),
            start_date: at(2023, 3, 10),
            end_date: at(2024, 3, 10),
            monthly_amount: dec!(1000),
        }];
        (subscriptions, customers)
    }

    #[test]
    fn snapshot_counts_only_active_records() {
        let (subs, customers) = fixtures();
        let snap = snapshot_at(&subs, &customers, at(2023, 4, 1));

        assert_eq!(snap.recurring_revenue_from_billing, dec!(70));
        assert_eq!(snap.active_subscription_count, 2);
        assert_eq!(snap.recurring_revenue_from_direct_customers, dec!(1000));
        assert_eq!(snap.active_direct_customer_count, 1);
        assert_eq!(snap.total_revenue, dec!(1070));

        let later = snapshot_at(&subs, &customers, at(2023, 4, 2));
        assert_eq!(later.active_subscription_count, 1);
    }

    #[test]
    fn samples_month_starts_and_a_final_now_point() {
        let now = Utc.with_ymd_and_hms(2023, 6, 17, 12, 0, 0).unwrap();
        let times = sample_times(now, Duration::weeks(13));

        // now - 13 weeks is 2023-03-18, so the first month start is April.
        assert_eq!(times, vec![at(2023, 4, 1), at(2023, 5, 1), at(2023, 6, 1), now]);
    }

    #[test]
    fn now_on_a_boundary_is_not_duplicated() {
        let now = at(2023, 6, 1);
        let times = sample_times(now, Duration::weeks(5));
        assert_eq!(times, vec![at(2023, 5, 1), at(2023, 6, 1)]);
    }

    #[test]
    fn annualization_is_linear_across_every_revenue_field() {
        let (subs, customers) = fixtures();
        let now = at(2023, 8, 20);
        let monthly = revenue_series(&subs, &customers, RevenueGranularity::Mrr, now, Duration::weeks(52));
        let yearly = revenue_series(&subs, &customers, RevenueGranularity::Arr, now, Duration::weeks(52));

        assert_eq!(monthly.len(), yearly.len());
        for (m, y) in monthly.iter().zip(&yearly) {
            assert_eq!(y.time, m.time);
            assert_eq!(y.recurring_revenue_from_billing, m.recurring_revenue_from_billing * dec!(12));
            assert_eq!(
                y.recurring_revenue_from_direct_customers,
                m.recurring_revenue_from_direct_customers * dec!(12)
            );
            assert_eq!(y.total_revenue, m.total_revenue * dec!(12));
            assert_eq!(y.active_subscription_count, m.active_subscription_count);
            assert_eq!(y.active_direct_customer_count, m.active_direct_customer_count);
        }
    }

    #[test]
    fn current_customers_exclude_ended_contracts() {
        let (_, mut customers) = fixtures();
        customers.push(DirectCustomer {
            name: "Old".into(),
            start_date: at(2022, 1, 1),
            end_date: at(2022, 12, 31),
            monthly_amount: dec!(10),
        });
        let current = current_direct_customers(&customers, at(2023, 6, 1));
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].name, "Acme");
    }
}
