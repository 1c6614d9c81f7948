use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, create_checkout, get_eligibility, list_available_copies, list_user_checkouts,
    return_book,
};

/// Creates the API router with all checkout management endpoints
///
/// Command endpoints (Write operations):
/// - POST /checkouts - Check out a book copy
/// - POST /returns - Return a book copy
///
/// Query endpoints (Read operations):
/// - GET /users/:card_number/checkouts - Open checkouts, soonest due first
/// - GET /users/:card_number/eligibility - Whether the user may borrow
/// - GET /books/:isbn/available-copies - Copy numbers not checked out
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Command endpoints (Write operations)
        .route("/checkouts", post(create_checkout))
        .route("/returns", post(return_book))
        // Query endpoints (Read operations)
        .route("/users/:card_number/checkouts", get(list_user_checkouts))
        .route("/users/:card_number/eligibility", get(get_eligibility))
        .route("/books/:isbn/available-copies", get(list_available_copies))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
