//! Query/filter engine
//!
//! Translates optional filter criteria plus pagination into a conjunctive
//! SQL predicate and a deterministic page window. The predicate builder is
//! pure with respect to the storage engine and is unit-tested on the SQL
//! it generates.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use sqlx::{Postgres, QueryBuilder};

use crate::domain::{Payment, PaymentMethod, PaymentStatus};

/// Optional criteria, combined conjunctively. Absent criteria impose no
/// constraint. Dates are at day granularity, both bounds inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaymentFilter {
    pub status: Option<PaymentStatus>,
    pub method: Option<PaymentMethod>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// UTC midnight at the start of `date`.
pub fn day_start_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// UTC midnight of the day after `date` — the exclusive upper bound that
/// makes an end date inclusive to its last instant.
pub fn day_end_exclusive_utc(date: NaiveDate) -> DateTime<Utc> {
    day_start_utc(date.succ_opt().unwrap_or(NaiveDate::MAX))
}

/// Append the WHERE clause for `filter` to a query being built.
///
/// Criteria are ANDed in a fixed order (status, method, start, end) so the
/// generated SQL is deterministic.
pub fn push_predicate(qb: &mut QueryBuilder<'_, Postgres>, filter: &PaymentFilter) {
    let mut prefix = " WHERE ";

    if let Some(status) = filter.status {
        qb.push(prefix).push("status = ").push_bind(status.as_str());
        prefix = " AND ";
    }

    if let Some(method) = filter.method {
        qb.push(prefix).push("method = ").push_bind(method.as_str());
        prefix = " AND ";
    }

    if let Some(start) = filter.start_date {
        qb.push(prefix)
            .push("created_at >= ")
            .push_bind(day_start_utc(start));
        prefix = " AND ";
    }

    if let Some(end) = filter.end_date {
        qb.push(prefix)
            .push("created_at < ")
            .push_bind(day_end_exclusive_utc(end));
    }
}

/// Normalized pagination window (1-based page).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
}

impl PageParams {
    /// Coerce raw query input: page < 1 becomes 1, a missing or
    /// non-positive limit becomes 10.
    pub fn normalize(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.filter(|p| *p >= 1).unwrap_or(1),
            limit: limit.filter(|l| *l >= 1).unwrap_or(10),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// ceil(total / limit); 0 when the match set is empty.
    pub fn page_count(&self, total: i64) -> i64 {
        if total == 0 {
            0
        } else {
            (total + self.limit - 1) / self.limit
        }
    }
}

/// One page of query results plus the total match count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPage {
    pub data: Vec<Payment>,
    pub total: i64,
    pub page: i64,
    pub page_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql_for(filter: &PaymentFilter) -> String {
        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM payments");
        push_predicate(&mut qb, filter);
        qb.into_sql()
    }

    #[test]
    fn test_no_criteria_no_where_clause() {
        assert_eq!(sql_for(&PaymentFilter::default()), "SELECT COUNT(*) FROM payments");
    }

    #[test]
    fn test_single_criterion() {
        let filter = PaymentFilter {
            status: Some(PaymentStatus::Success),
            ..Default::default()
        };
        assert_eq!(
            sql_for(&filter),
            "SELECT COUNT(*) FROM payments WHERE status = $1"
        );
    }

    #[test]
    fn test_all_criteria_are_conjunctive() {
        let filter = PaymentFilter {
            status: Some(PaymentStatus::Failed),
            method: Some(PaymentMethod::Upi),
            start_date: Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            end_date: Some(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()),
        };
        assert_eq!(
            sql_for(&filter),
            "SELECT COUNT(*) FROM payments WHERE status = $1 AND method = $2 \
             AND created_at >= $3 AND created_at < $4"
        );
    }

    #[test]
    fn test_date_only_filter() {
        let filter = PaymentFilter {
            end_date: Some(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()),
            ..Default::default()
        };
        assert_eq!(
            sql_for(&filter),
            "SELECT COUNT(*) FROM payments WHERE created_at < $1"
        );
    }

    #[test]
    fn test_day_bounds_inclusive_at_both_ends() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            day_start_utc(date).to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
        // A record at the end date's midnight is >= start and < next-day
        // midnight; one created the instant after 23:59:59.999... is not.
        assert_eq!(
            day_end_exclusive_utc(date).to_rfc3339(),
            "2024-01-02T00:00:00+00:00"
        );
    }

    #[test]
    fn test_page_normalization() {
        assert_eq!(
            PageParams::normalize(None, None),
            PageParams { page: 1, limit: 10 }
        );
        assert_eq!(
            PageParams::normalize(Some(0), Some(-5)),
            PageParams { page: 1, limit: 10 }
        );
        assert_eq!(
            PageParams::normalize(Some(-3), Some(0)),
            PageParams { page: 1, limit: 10 }
        );
        assert_eq!(
            PageParams::normalize(Some(3), Some(25)),
            PageParams { page: 3, limit: 25 }
        );
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageParams { page: 1, limit: 10 }.offset(), 0);
        assert_eq!(PageParams { page: 3, limit: 10 }.offset(), 20);
        assert_eq!(PageParams { page: 5, limit: 7 }.offset(), 28);
    }

    #[test]
    fn test_page_count() {
        let params = PageParams { page: 1, limit: 10 };
        assert_eq!(params.page_count(0), 0);
        assert_eq!(params.page_count(1), 1);
        assert_eq!(params.page_count(10), 1);
        assert_eq!(params.page_count(11), 2);
        assert_eq!(params.page_count(25), 3);
    }
}
