//! Stats aggregator
//!
//! Computes the dashboard bundle over the entire unfiltered ledger at call
//! time, reading exclusively through the ledger store. All windows are
//! UTC; the week starts on Sunday. The sub-queries are mutually
//! independent reads and are evaluated concurrently. The service holds no
//! state between calls.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use futures_util::future::try_join_all;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::PaymentStatus;
use crate::error::AppError;
use crate::ledger::{LedgerStore, PaymentFilter};

/// Revenue attributed to one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: Decimal,
}

/// The aggregate bundle returned by `GET /payments/stats`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsBundle {
    pub total_today: i64,
    pub total_week: i64,
    /// Gross volume: sums every record regardless of status.
    pub total_revenue: Decimal,
    pub failed_count: i64,
    /// Exactly 7 entries, oldest first, ending today.
    pub last_7_days: Vec<DailyRevenue>,
}

/// The Sunday that starts the week containing `now`, in UTC.
pub fn week_start_date(now: DateTime<Utc>) -> NaiveDate {
    let days_back = now.weekday().num_days_from_sunday() as i64;
    now.date_naive() - Duration::days(days_back)
}

/// The 7 most recent calendar days ending at `today`, oldest first.
pub fn last_7_dates(today: NaiveDate) -> Vec<NaiveDate> {
    (0..7)
        .rev()
        .map(|back| today - Duration::days(back))
        .collect()
}

/// Read-only aggregate computation over the ledger store.
#[derive(Debug, Clone)]
pub struct StatsService {
    ledger: LedgerStore,
}

impl StatsService {
    pub fn new(ledger: LedgerStore) -> Self {
        Self { ledger }
    }

    /// Compute the full bundle against the current instant.
    pub async fn bundle(&self) -> Result<StatsBundle, AppError> {
        let now = Utc::now();
        let today = now.date_naive();

        let since_today = PaymentFilter {
            start_date: Some(today),
            ..Default::default()
        };
        let since_week_start = PaymentFilter {
            start_date: Some(week_start_date(now)),
            ..Default::default()
        };
        let failed = PaymentFilter {
            status: Some(PaymentStatus::Failed),
            ..Default::default()
        };

        let all_filter = PaymentFilter::default();
        let (today_agg, week_agg, all_agg, failed_agg, last_7_days) = tokio::try_join!(
            self.ledger.aggregate(&since_today),
            self.ledger.aggregate(&since_week_start),
            self.ledger.aggregate(&all_filter),
            self.ledger.aggregate(&failed),
            self.last_7_days(today),
        )?;

        Ok(StatsBundle {
            total_today: today_agg.0,
            total_week: week_agg.0,
            total_revenue: all_agg.1,
            failed_count: failed_agg.0,
            last_7_days,
        })
    }

    /// One aggregate per day; the windows never overlap, so the seven
    /// reads run concurrently.
    async fn last_7_days(&self, today: NaiveDate) -> Result<Vec<DailyRevenue>, AppError> {
        let per_day = last_7_dates(today).into_iter().map(|date| async move {
            let window = PaymentFilter {
                start_date: Some(date),
                end_date: Some(date),
                ..Default::default()
            };
            let (_, revenue) = self.ledger.aggregate(&window).await?;
            Ok::<_, AppError>(DailyRevenue { date, revenue })
        });

        try_join_all(per_day).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::filter::day_start_utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_start_is_sunday() {
        // 2024-01-03 is a Wednesday; the week began Sunday 2023-12-31.
        let now: DateTime<Utc> = "2024-01-03T15:45:00Z".parse().unwrap();
        assert_eq!(week_start_date(now), date(2023, 12, 31));

        // A Sunday is its own week start, right up to its last second.
        let sunday: DateTime<Utc> = "2024-01-07T23:59:59Z".parse().unwrap();
        assert_eq!(week_start_date(sunday), date(2024, 1, 7));
    }

    #[test]
    fn test_week_start_window_begins_at_midnight() {
        let now: DateTime<Utc> = "2024-01-03T15:45:00Z".parse().unwrap();
        assert_eq!(
            day_start_utc(week_start_date(now)).to_rfc3339(),
            "2023-12-31T00:00:00+00:00"
        );
    }

    #[test]
    fn test_last_7_dates_span_and_order() {
        let dates = last_7_dates(date(2024, 1, 7));

        assert_eq!(dates.len(), 7);
        assert_eq!(dates[0], date(2024, 1, 1));
        assert_eq!(dates[6], date(2024, 1, 7));
        for pair in dates.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::days(1));
        }
    }

    #[test]
    fn test_last_7_dates_cross_month_boundary() {
        let dates = last_7_dates(date(2024, 3, 2));
        assert_eq!(dates[0], date(2024, 2, 25));
        assert_eq!(dates[6], date(2024, 3, 2));
    }

    #[test]
    fn test_bundle_serializes_camel_case() {
        let bundle = StatsBundle {
            total_today: 1,
            total_week: 2,
            total_revenue: Decimal::new(100, 0),
            failed_count: 0,
            last_7_days: vec![],
        };

        let value = serde_json::to_value(&bundle).unwrap();
        assert!(value.get("totalToday").is_some());
        assert!(value.get("totalWeek").is_some());
        assert!(value.get("totalRevenue").is_some());
        assert!(value.get("failedCount").is_some());
        assert!(value.get("last7Days").is_some());
    }
}
