use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::error::{AppError, AppResult};
use crate::middleware::BRANCH_COOKIE;
use crate::models::{Branch, SelectBranchRequest};
use crate::AppState;

/// List branches, ordered by code
pub async fn index(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Branch>>> {
    let branches: Vec<Branch> = sqlx::query_as("SELECT * FROM branches ORDER BY code ASC")
        .fetch_all(state.db.pool())
        .await?;

    Ok(Json(branches))
}

/// Persist the branch selection in a long-lived cookie
pub async fn select(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<SelectBranchRequest>,
) -> AppResult<(CookieJar, StatusCode)> {
    let branch: Option<Branch> = sqlx::query_as("SELECT * FROM branches WHERE id = ?")
        .bind(&request.branch_id)
        .fetch_optional(state.db.pool())
        .await?;

    let branch = branch.ok_or(AppError::BranchNotFound)?;

    let cookie = Cookie::build((BRANCH_COOKIE, branch.id))
        .path("/")
        .max_age(time::Duration::days(state.config.cookie_days as i64))
        .same_site(SameSite::Lax)
        .build();

    Ok((jar.add(cookie), StatusCode::NO_CONTENT))
}
