//! Ledger module
//!
//! The append-only payment collection: filter/pagination semantics and the
//! Postgres-backed store.

pub mod filter;
pub mod store;

pub use filter::{PageParams, PaymentFilter, PaymentPage};
pub use store::LedgerStore;
