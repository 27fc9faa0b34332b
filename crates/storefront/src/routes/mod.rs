//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Health check
//!
//! # Checkout (requires x-user-id)
//! POST /api/checkout                        - Start checkout (201)
//! GET  /api/checkout/{id}                   - Current view
//! PUT  /api/checkout/{id}/shipping          - Update shipping draft
//! POST /api/checkout/{id}/advance           - Shipping -> payment
//! POST /api/checkout/{id}/back              - Previous step
//! PUT  /api/checkout/{id}/payment-method    - Select payment method
//! POST /api/checkout/{id}/place-order       - Create and pay the order
//! ```

pub mod checkout;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the checkout API router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::create))
        .route("/{id}", get(checkout::show))
        .route("/{id}/shipping", put(checkout::update_shipping))
        .route("/{id}/advance", post(checkout::advance))
        .route("/{id}/back", post(checkout::back))
        .route("/{id}/payment-method", put(checkout::select_payment_method))
        .route("/{id}/place-order", post(checkout::place_order))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new().nest("/api/checkout", checkout_routes())
}
