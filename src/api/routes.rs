//! API routes
//!
//! HTTP endpoint handlers and their request types.

use axum::{
    extract::{Extension, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

use crate::auth::LoginResponse;
use crate::domain::{AuthUser, Payment, PaymentDraft, UserInfo};
use crate::error::AppError;
use crate::export;
use crate::ledger::{PageParams, PaymentFilter, PaymentPage};
use crate::stats::StatsBundle;

use super::AppState;

// =========================================================================
// Request types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Filter and pagination criteria shared by the list and export endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPaymentsQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl ListPaymentsQuery {
    /// Typed conjunctive filter; unknown enum values are a validation
    /// error, empty strings mean "no constraint".
    pub fn filter(&self) -> Result<PaymentFilter, AppError> {
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| s.parse())
            .transpose()?;
        let method = self
            .method
            .as_deref()
            .filter(|m| !m.is_empty())
            .map(|m| m.parse())
            .transpose()?;

        Ok(PaymentFilter {
            status,
            method,
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }

    pub fn page_params(&self) -> PageParams {
        PageParams::normalize(self.page, self.limit)
    }
}

/// Creation payload. Fields are optional at the serde layer so that a
/// missing or malformed field surfaces as the service's own validation
/// error rather than a deserializer rejection.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
    #[serde(default)]
    pub receiver: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Accept a JSON number or a numeric string, the way the clients send it.
fn parse_amount(value: &serde_json::Value) -> Result<Decimal, AppError> {
    let parsed = match value {
        serde_json::Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .ok()
                .or_else(|| Decimal::from_scientific(&text).ok())
        }
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    };

    parsed.ok_or_else(|| AppError::Validation("amount must be a number".to_string()))
}

// =========================================================================
// POST /auth/login
// =========================================================================

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = state.auth.login(&request.username, &request.password).await?;
    Ok(Json(response))
}

// =========================================================================
// GET /payments
// =========================================================================

pub async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<ListPaymentsQuery>,
) -> Result<Json<PaymentPage>, AppError> {
    let filter = query.filter()?;
    let page = query.page_params();
    let result = state.ledger.query(&filter, &page).await?;
    Ok(Json(result))
}

// =========================================================================
// GET /payments/stats
// =========================================================================

pub async fn payment_stats(
    State(state): State<AppState>,
) -> Result<Json<StatsBundle>, AppError> {
    let bundle = state.stats.bundle().await?;
    Ok(Json(bundle))
}

// =========================================================================
// GET /payments/export
// =========================================================================

/// Same filters as the list endpoint, with the page window replaced by
/// the configured hard cap so the document captures the full matching set.
pub async fn export_payments(
    State(state): State<AppState>,
    Query(query): Query<ListPaymentsQuery>,
) -> Result<Response, AppError> {
    let filter = query.filter()?;
    let page = PageParams {
        page: 1,
        limit: state.export_max_rows,
    };
    let result = state.ledger.query(&filter, &page).await?;

    let body = export::encode_csv(&result.data);
    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", export::EXPORT_FILENAME),
        ),
    ];

    Ok((headers, body).into_response())
}

// =========================================================================
// GET /payments/:id
// =========================================================================

pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Payment>, AppError> {
    let payment = state.ledger.get_by_id(id).await?;
    Ok(Json(payment))
}

// =========================================================================
// POST /payments
// =========================================================================

pub async fn create_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<Payment>), AppError> {
    let amount = request
        .amount
        .as_ref()
        .ok_or_else(|| AppError::Validation("amount is required".to_string()))
        .and_then(parse_amount)?;
    let receiver = request
        .receiver
        .ok_or_else(|| AppError::Validation("receiver is required".to_string()))?;
    let status = request
        .status
        .as_deref()
        .ok_or_else(|| AppError::Validation("status is required".to_string()))?
        .parse()?;
    let method = request
        .method
        .as_deref()
        .ok_or_else(|| AppError::Validation("method is required".to_string()))?
        .parse()?;

    let draft = PaymentDraft::new(amount, receiver, status, method)?;
    let payment = state.ledger.insert(draft, user.id).await?;

    // Fan out without making the response wait on subscriber delivery.
    let hub = state.events.clone();
    let created = payment.clone();
    tokio::spawn(async move { hub.publish_payment_created(&created).await });

    Ok((StatusCode::CREATED, Json(payment)))
}

// =========================================================================
// GET /users
// =========================================================================

pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserInfo>>, AppError> {
    let users = state.users.list().await?;
    Ok(Json(users))
}

// =========================================================================
// POST /users
// =========================================================================

/// The one role-sensitive operation: only admins may create accounts.
pub async fn create_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserInfo>), AppError> {
    if !caller.role.is_admin() {
        return Err(AppError::Forbidden(
            "Only admin can create users".to_string(),
        ));
    }

    let role = request.role.as_deref().unwrap_or("viewer").parse()?;
    let user = state
        .users
        .create(&request.username, &request.password, role)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}
