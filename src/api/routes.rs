//! REST API routes configuration

use crate::api::handlers::{self, ApiError, ApiState};
use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

/// JSON 404 for unknown paths
async fn fallback_handler(uri: axum::http::Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError {
            error: format!("Not Found: {}", uri.path()),
        }),
    )
}

/// Create the API router with all routes
pub fn create_router(state: ApiState) -> Router {
    // Configure CORS for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Ledger
        .route("/api/ledger", get(handlers::get_ledger_info))
        .route("/api/events", get(handlers::list_events))
        .route("/api/deposit", post(handlers::deposit))
        // Transactions
        .route(
            "/api/transactions",
            get(handlers::list_transactions).post(handlers::submit_transaction),
        )
        .route("/api/transactions/pending", get(handlers::list_pending))
        .route("/api/transactions/{index}", get(handlers::get_transaction))
        .route(
            "/api/transactions/{index}/confirmations",
            get(handlers::get_confirmations),
        )
        .route(
            "/api/transactions/{index}/confirm",
            post(handlers::confirm_transaction),
        )
        .route(
            "/api/transactions/{index}/revoke",
            post(handlers::revoke_confirmation),
        )
        .fallback(fallback_handler)
        // Add state and middleware
        .with_state(state)
        .layer(cors)
}
