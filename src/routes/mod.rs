pub mod auth;
pub mod branches;
pub mod cart;
pub mod catalog;
pub mod checkout;

use axum::http::StatusCode;

/// Health check endpoint
pub async fn health() -> StatusCode {
    StatusCode::OK
}
