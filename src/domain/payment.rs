//! Payment record types
//!
//! A payment is immutable once created: the ledger assigns `id` and
//! `created_at`, and no operation in the service mutates or removes a row.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Processing outcome of a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Success,
    Failed,
    Pending,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Pending => "pending",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(PaymentStatus::Success),
            "failed" => Ok(PaymentStatus::Failed),
            "pending" => Ok(PaymentStatus::Pending),
            other => Err(AppError::Validation(format!(
                "Invalid status '{}' (expected success, failed or pending)",
                other
            ))),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Upi,
    Netbanking,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Netbanking => "netbanking",
            PaymentMethod::Cash => "cash",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(PaymentMethod::Card),
            "upi" => Ok(PaymentMethod::Upi),
            "netbanking" => Ok(PaymentMethod::Netbanking),
            "cash" => Ok(PaymentMethod::Cash),
            other => Err(AppError::Validation(format!(
                "Invalid method '{}' (expected card, upi, netbanking or cash)",
                other
            ))),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted payment record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub amount: Decimal,
    pub receiver: String,
    pub status: PaymentStatus,
    pub method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
}

/// A validated creation payload, before the ledger assigns id/timestamp
#[derive(Debug, Clone)]
pub struct PaymentDraft {
    pub amount: Decimal,
    pub receiver: String,
    pub status: PaymentStatus,
    pub method: PaymentMethod,
}

impl PaymentDraft {
    /// Build a draft, enforcing the creation-time constraints.
    ///
    /// # Errors
    /// `AppError::Validation` when receiver is empty after trimming.
    pub fn new(
        amount: Decimal,
        receiver: String,
        status: PaymentStatus,
        method: PaymentMethod,
    ) -> Result<Self, AppError> {
        let receiver = receiver.trim().to_string();
        if receiver.is_empty() {
            return Err(AppError::Validation(
                "receiver must not be empty".to_string(),
            ));
        }

        Ok(Self {
            amount,
            receiver,
            status,
            method,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_round_trip() {
        for s in ["success", "failed", "pending"] {
            let status: PaymentStatus = s.parse().unwrap();
            assert_eq!(status.as_str(), s);
        }
        assert!("refunded".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_method_round_trip() {
        for m in ["card", "upi", "netbanking", "cash"] {
            let method: PaymentMethod = m.parse().unwrap();
            assert_eq!(method.as_str(), m);
        }
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_enum_serde_lowercase() {
        let json = serde_json::to_string(&PaymentStatus::Failed).unwrap();
        assert_eq!(json, "\"failed\"");

        let method: PaymentMethod = serde_json::from_str("\"netbanking\"").unwrap();
        assert_eq!(method, PaymentMethod::Netbanking);
    }

    #[test]
    fn test_draft_trims_receiver() {
        let draft = PaymentDraft::new(
            dec!(50),
            "  Test User  ".to_string(),
            PaymentStatus::Success,
            PaymentMethod::Card,
        )
        .unwrap();
        assert_eq!(draft.receiver, "Test User");
    }

    #[test]
    fn test_draft_rejects_empty_receiver() {
        let result = PaymentDraft::new(
            dec!(50),
            "   ".to_string(),
            PaymentStatus::Success,
            PaymentMethod::Card,
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_payment_serializes_camel_case() {
        let payment = Payment {
            id: 1,
            amount: dec!(50.00),
            receiver: "Test User".to_string(),
            status: PaymentStatus::Success,
            method: PaymentMethod::Card,
            created_at: "2024-01-01T00:00:00Z".parse().unwrap(),
            user_id: 7,
        };

        let value = serde_json::to_value(&payment).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("userId").is_some());
        assert!(value.get("created_at").is_none());
    }
}
