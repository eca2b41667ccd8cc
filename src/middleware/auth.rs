// Auth extractors are part of the public API - may not all be used internally yet
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use serde_json::json;

use crate::models::User;
use crate::AppState;

const SESSION_COOKIE: &str = "session";

/// Extractor for the current authenticated user (required)
pub struct CurrentUser(pub User);

/// Extractor for optional user (may or may not be logged in)
pub struct OptionalUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| AuthError::Internal)?;

        let user = get_user_from_session(state, &jar)
            .await
            .map_err(|_| AuthError::Internal)?
            .ok_or(AuthError::NotAuthenticated)?;

        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for OptionalUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| AuthError::Internal)?;

        let user = get_user_from_session(state, &jar)
            .await
            .map_err(|_| AuthError::Internal)?;

        Ok(OptionalUser(user))
    }
}

/// Authentication errors
#[derive(Debug)]
pub enum AuthError {
    NotAuthenticated,
    Internal,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthError::NotAuthenticated => (
                StatusCode::UNAUTHORIZED,
                "not_authenticated",
                "Not authenticated",
            ),
            AuthError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error",
            ),
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

/// Get user from session cookie
pub(crate) async fn get_user_from_session(
    state: &AppState,
    jar: &CookieJar,
) -> Result<Option<User>, sqlx::Error> {
    let session_id = match jar.get(SESSION_COOKIE) {
        Some(cookie) => cookie.value().to_string(),
        None => return Ok(None),
    };

    // Get session
    let session: Option<crate::models::Session> =
        sqlx::query_as("SELECT * FROM sessions WHERE id = ? AND expires_at > CURRENT_TIMESTAMP")
            .bind(&session_id)
            .fetch_optional(state.db.pool())
            .await?;

    let session = match session {
        Some(s) => s,
        None => return Ok(None),
    };

    // Get user
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(session.user_id)
        .fetch_optional(state.db.pool())
        .await?;

    Ok(user)
}
