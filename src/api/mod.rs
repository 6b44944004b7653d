//! API module
//!
//! Router assembly and shared application state. Every service is built
//! once at startup and passed in explicitly; handlers reach them through
//! `AppState`.

pub mod middleware;
pub mod routes;
pub mod ws;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::AuthService;
use crate::ledger::LedgerStore;
use crate::notifier::EventHub;
use crate::stats::StatsService;
use crate::users::UserDirectory;

/// Explicitly constructed service graph, cloned into each handler.
#[derive(Clone)]
pub struct AppState {
    pub ledger: LedgerStore,
    pub stats: StatsService,
    pub users: UserDirectory,
    pub auth: AuthService,
    pub events: EventHub,
    pub export_max_rows: i64,
}

/// Build the full application router.
///
/// `/health` and `/auth/login` are public; everything else sits behind the
/// access guard, which runs before any handler or store access.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/payments",
            get(routes::list_payments).post(routes::create_payment),
        )
        .route("/payments/stats", get(routes::payment_stats))
        .route("/payments/export", get(routes::export_payments))
        .route("/payments/:id", get(routes::get_payment))
        .route("/users", get(routes::list_users).post(routes::create_user))
        .route("/events", get(ws::events_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_guard,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(routes::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
