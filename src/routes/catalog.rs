use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::extract::CookieJar;

use crate::error::{AppError, AppResult};
use crate::middleware::BRANCH_COOKIE;
use crate::models::{Branch, CatalogQuery, CategoryView, ProductDetail};
use crate::services;
use crate::AppState;

/// Active branch: `?city=` overrides the cookie
fn resolve_branch(query_city: Option<&str>, jar: &CookieJar) -> Option<String> {
    query_city
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .or_else(|| jar.get(BRANCH_COOKIE).map(|c| c.value().to_string()))
}

/// Catalog tree for the selected branch, stop-list pruned
pub async fn index(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<CatalogQuery>,
) -> AppResult<Json<Vec<CategoryView>>> {
    let branch_id =
        resolve_branch(query.city.as_deref(), &jar).ok_or(AppError::BranchNotSelected)?;

    let branch: Option<Branch> = sqlx::query_as("SELECT * FROM branches WHERE id = ?")
        .bind(&branch_id)
        .fetch_optional(state.db.pool())
        .await?;
    if branch.is_none() {
        return Err(AppError::BranchNotFound);
    }

    let categories = services::find_catalog(
        &state.db,
        &branch_id,
        &query,
        state.config.default_min_price,
        state.config.default_max_price,
    )
    .await?;

    Ok(Json(categories))
}

/// Product detail with category siblings, stop-list pruned. Without a
/// selected branch nothing is excluded.
pub async fn show(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<i64>,
) -> AppResult<Json<ProductDetail>> {
    let excluded = match resolve_branch(None, &jar) {
        Some(branch_id) => services::excluded_skus(&state.db, &branch_id).await?,
        None => HashSet::new(),
    };

    let detail = services::product_detail(&state.db, id, &excluded).await?;

    Ok(Json(detail))
}
