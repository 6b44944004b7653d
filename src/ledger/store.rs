//! Ledger store
//!
//! Durable, ordered, append-only persistence of payment records. The only
//! write path is `insert`; every read re-derives from the database so
//! concurrent writers are visible on the next call.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{Payment, PaymentDraft};
use crate::error::AppError;

use super::filter::{push_predicate, PageParams, PaymentFilter, PaymentPage};

/// Raw row shape shared by every payment query.
type PaymentRow = (
    i64,
    Decimal,
    String,
    String,
    String,
    chrono::DateTime<chrono::Utc>,
    i64,
);

const PAYMENT_COLUMNS: &str = "id, amount, receiver, status, method, created_at, user_id";

fn row_to_payment(row: PaymentRow) -> Result<Payment, AppError> {
    let (id, amount, receiver, status, method, created_at, user_id) = row;

    // A row that fails to parse means the table holds a value outside the
    // fixed enum sets, which the schema CHECKs should make impossible.
    let status = status
        .parse()
        .map_err(|_| AppError::Internal(format!("payment {} has corrupt status", id)))?;
    let method = method
        .parse()
        .map_err(|_| AppError::Internal(format!("payment {} has corrupt method", id)))?;

    Ok(Payment {
        id,
        amount,
        receiver,
        status,
        method,
        created_at,
        user_id,
    })
}

/// Postgres-backed payment ledger.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    pool: PgPool,
}

impl LedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append a payment. The database assigns the next id and the creation
    /// timestamp; the returned record is the caller's read-your-own-write.
    pub async fn insert(&self, draft: PaymentDraft, user_id: i64) -> Result<Payment, AppError> {
        let row: PaymentRow = sqlx::query_as(
            r#"
            INSERT INTO payments (amount, receiver, status, method, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, amount, receiver, status, method, created_at, user_id
            "#,
        )
        .bind(draft.amount)
        .bind(&draft.receiver)
        .bind(draft.status.as_str())
        .bind(draft.method.as_str())
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        row_to_payment(row)
    }

    /// Point lookup by id.
    pub async fn get_by_id(&self, id: i64) -> Result<Payment, AppError> {
        let row: Option<PaymentRow> = sqlx::query_as(
            r#"
            SELECT id, amount, receiver, status, method, created_at, user_id
            FROM payments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_payment(row),
            None => Err(AppError::NotFound("Payment".to_string())),
        }
    }

    /// One page of matching records, newest first (ties broken by id so the
    /// order is deterministic), plus the total match count. The page and
    /// the count are independent reads and run concurrently.
    pub async fn query(
        &self,
        filter: &PaymentFilter,
        page: &PageParams,
    ) -> Result<PaymentPage, AppError> {
        let (data, total) = tokio::try_join!(self.fetch_page(filter, page), self.count(filter))?;

        Ok(PaymentPage {
            data,
            total,
            page: page.page,
            page_count: page.page_count(total),
        })
    }

    /// Count and sum of amount over every record matching `filter`,
    /// regardless of pagination.
    pub async fn aggregate(&self, filter: &PaymentFilter) -> Result<(i64, Decimal), AppError> {
        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*), COALESCE(SUM(amount), 0) FROM payments");
        push_predicate(&mut qb, filter);

        let (count, sum): (i64, Decimal) = qb.build_query_as().fetch_one(&self.pool).await?;
        Ok((count, sum))
    }

    async fn fetch_page(
        &self,
        filter: &PaymentFilter,
        page: &PageParams,
    ) -> Result<Vec<Payment>, AppError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM payments",
            PAYMENT_COLUMNS
        ));
        push_predicate(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows: Vec<PaymentRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_payment).collect()
    }

    async fn count(&self, filter: &PaymentFilter) -> Result<i64, AppError> {
        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM payments");
        push_predicate(&mut qb, filter);

        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total)
    }
}
