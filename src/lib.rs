//! paytrack Library
//!
//! Re-exports modules for integration testing and external use.

pub mod api;
pub mod auth;
pub mod domain;
pub mod export;
pub mod ledger;
pub mod notifier;
pub mod stats;
pub mod users;

// Modules used by the binaries
pub mod config;
pub mod db;
mod error;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use domain::{AuthUser, Payment, PaymentDraft, PaymentMethod, PaymentStatus, Role, UserInfo};
