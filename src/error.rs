use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid phone or password")]
    InvalidCredentials,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Session expired")]
    SessionExpired,

    // User errors
    #[error("User not found")]
    UserNotFound,

    #[error("A user with this phone already exists")]
    UserAlreadyExists,

    #[error("Phone is not verified")]
    PhoneNotVerified,

    #[error("Invalid verification code")]
    InvalidVerificationCode,

    #[error("This phone is already used by another user")]
    PhoneTaken,

    // Branch errors
    #[error("Branch not found")]
    BranchNotFound,

    #[error("No branch selected")]
    BranchNotSelected,

    // Catalog errors
    #[error("Product not found")]
    ProductNotFound,

    #[error("Product is not available in the selected branch")]
    ProductUnavailable,

    #[error("Product variant not found")]
    VariantNotFound,

    #[error("Ingredient not found")]
    IngredientNotFound,

    // Cart errors
    #[error("Cart not found")]
    CartNotFound,

    #[error("Cart is empty")]
    CartEmpty,

    #[error("Cart item not found")]
    CartItemNotFound,

    // Order errors
    #[error("Order not found")]
    OrderNotFound,

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    // Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    /// Stable machine-readable code used in the JSON error body
    fn code(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::NotAuthenticated => "not_authenticated",
            AppError::SessionExpired => "session_expired",
            AppError::UserNotFound => "user_not_found",
            AppError::UserAlreadyExists => "user_already_exists",
            AppError::PhoneNotVerified => "phone_not_verified",
            AppError::InvalidVerificationCode => "invalid_verification_code",
            AppError::PhoneTaken => "phone_taken",
            AppError::BranchNotFound => "branch_not_found",
            AppError::BranchNotSelected => "branch_not_selected",
            AppError::ProductNotFound => "product_not_found",
            AppError::ProductUnavailable => "product_unavailable",
            AppError::VariantNotFound => "variant_not_found",
            AppError::IngredientNotFound => "ingredient_not_found",
            AppError::CartNotFound => "cart_not_found",
            AppError::CartEmpty => "cart_empty",
            AppError::CartItemNotFound => "cart_item_not_found",
            AppError::OrderNotFound => "order_not_found",
            AppError::Database(_) | AppError::Internal(_) => "internal_error",
            AppError::InvalidInput(_) => "invalid_input",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            // 400 Bad Request
            AppError::InvalidInput(_) | AppError::InvalidVerificationCode => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }

            // 401 Unauthorized
            AppError::InvalidCredentials
            | AppError::NotAuthenticated
            | AppError::SessionExpired => (StatusCode::UNAUTHORIZED, self.to_string()),

            // 404 Not Found
            AppError::UserNotFound
            | AppError::BranchNotFound
            | AppError::ProductNotFound
            | AppError::VariantNotFound
            | AppError::IngredientNotFound
            | AppError::CartItemNotFound
            | AppError::OrderNotFound => (StatusCode::NOT_FOUND, self.to_string()),

            // 409 Conflict
            AppError::UserAlreadyExists
            | AppError::PhoneNotVerified
            | AppError::PhoneTaken
            | AppError::BranchNotSelected
            | AppError::ProductUnavailable
            | AppError::CartNotFound
            | AppError::CartEmpty => (StatusCode::CONFLICT, self.to_string()),

            // 500 Internal Server Error
            AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!("Internal error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": self.code(),
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
