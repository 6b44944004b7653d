//! Export encoder
//!
//! Renders a filtered record set as a fixed-schema CSV document. The
//! column order is a compatibility contract; changing it requires a
//! version bump.

use chrono::SecondsFormat;
use std::borrow::Cow;

use crate::domain::Payment;

/// The filename hint sent with the document.
pub const EXPORT_FILENAME: &str = "payments.csv";

const HEADER: &str = "id,amount,receiver,status,method,createdAt,userId";

/// Quote a field when it contains a delimiter, quote or line break;
/// embedded quotes are doubled. Everything else passes through untouched.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value
        .chars()
        .any(|c| matches!(c, ',' | '"' | '\n' | '\r'))
    {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Encode records into a CSV document: header row, then one row per
/// record. An empty slice yields a header-only document, not an error.
pub fn encode_csv(payments: &[Payment]) -> String {
    let mut out = String::with_capacity(64 * (payments.len() + 1));
    out.push_str(HEADER);
    out.push('\n');

    for p in payments {
        out.push_str(&p.id.to_string());
        out.push(',');
        out.push_str(&p.amount.to_string());
        out.push(',');
        out.push_str(&csv_field(&p.receiver));
        out.push(',');
        out.push_str(p.status.as_str());
        out.push(',');
        out.push_str(p.method.as_str());
        out.push(',');
        out.push_str(&p.created_at.to_rfc3339_opts(SecondsFormat::Millis, true));
        out.push(',');
        out.push_str(&p.user_id.to_string());
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PaymentMethod, PaymentStatus};
    use rust_decimal_macros::dec;

    fn payment(id: i64, receiver: &str) -> Payment {
        Payment {
            id,
            amount: dec!(120.50),
            receiver: receiver.to_string(),
            status: PaymentStatus::Success,
            method: PaymentMethod::Card,
            created_at: "2024-01-05T10:30:00Z".parse().unwrap(),
            user_id: 2,
        }
    }

    #[test]
    fn test_header_only_for_empty_set() {
        assert_eq!(encode_csv(&[]), "id,amount,receiver,status,method,createdAt,userId\n");
    }

    #[test]
    fn test_row_encoding() {
        let csv = encode_csv(&[payment(7, "Acme Corp")]);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,amount,receiver,status,method,createdAt,userId"
        );
        assert_eq!(
            lines.next().unwrap(),
            "7,120.50,Acme Corp,success,card,2024-01-05T10:30:00.000Z,2"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_receiver_with_comma_is_quoted() {
        let csv = encode_csv(&[payment(1, "Acme, Inc.")]);
        assert!(csv.contains("\"Acme, Inc.\""));
    }

    #[test]
    fn test_receiver_with_quote_is_doubled() {
        let csv = encode_csv(&[payment(1, "Bob \"The Builder\"")]);
        assert!(csv.contains("\"Bob \"\"The Builder\"\"\""));
    }

    #[test]
    fn test_plain_fields_unquoted() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("with space"), "with space");
    }
}
