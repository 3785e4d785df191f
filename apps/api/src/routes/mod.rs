pub mod health;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};

use crate::nl2gql::handlers;
use crate::nl2gql::normalize::Outcome;
use crate::state::AppState;

/// Unknown paths get the same `{"error": {"message"}}` envelope as the pipeline.
async fn not_found() -> Outcome {
    Outcome::error("Not found", StatusCode::NOT_FOUND)
}

async fn method_not_allowed() -> Outcome {
    Outcome::error("Method not allowed", StatusCode::METHOD_NOT_ALLOWED)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::health_handler))
        .route("/health", get(health::health_handler))
        .route("/nl2gql", post(handlers::handle_nl2gql))
        // Must follow the routes it applies to.
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .with_state(state)
}
