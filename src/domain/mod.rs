//! Domain module
//!
//! Core domain types shared across the service.

pub mod payment;
pub mod user;

pub use payment::{Payment, PaymentDraft, PaymentMethod, PaymentStatus};
pub use user::{AuthUser, Role, UserInfo};
