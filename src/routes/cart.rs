use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::error::{AppError, AppResult};
use crate::models::{
    AddCartItemRequest, Cart, CartItem, CartItemView, CartView, Ingredient, UpdateCartItemRequest,
    MAX_ITEM_QUANTITY,
};
use crate::services;
use crate::AppState;

const CART_COOKIE: &str = "cart_token";

/// 32 hex chars from the thread-local CSPRNG
fn generate_cart_token() -> String {
    let bytes: [u8; 16] = rand::random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn cart_cookie(token: String, days: u64) -> Cookie<'static> {
    Cookie::build((CART_COOKIE, token))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::days(days as i64))
        .same_site(SameSite::Lax)
        .build()
}

async fn find_cart(state: &AppState, jar: &CookieJar) -> AppResult<Option<Cart>> {
    let Some(cookie) = jar.get(CART_COOKIE) else {
        return Ok(None);
    };

    let cart: Option<Cart> = sqlx::query_as("SELECT * FROM carts WHERE token = ?")
        .bind(cookie.value())
        .fetch_optional(state.db.pool())
        .await?;

    Ok(cart)
}

async fn item_ingredients(state: &AppState, cart_item_id: i64) -> AppResult<Vec<Ingredient>> {
    let ingredients: Vec<Ingredient> = sqlx::query_as(
        "SELECT i.* FROM ingredients i \
         JOIN cart_item_ingredients cii ON cii.ingredient_id = i.id \
         WHERE cii.cart_item_id = ? ORDER BY i.id",
    )
    .bind(cart_item_id)
    .fetch_all(state.db.pool())
    .await?;

    Ok(ingredients)
}

/// Load the display view and persist the recomputed total on the cart row
pub(crate) async fn load_cart_view(state: &AppState, cart_id: i64) -> AppResult<CartView> {
    let items: Vec<CartItem> =
        sqlx::query_as("SELECT * FROM cart_items WHERE cart_id = ? ORDER BY created_at DESC, id DESC")
            .bind(cart_id)
            .fetch_all(state.db.pool())
            .await?;

    let mut views = Vec::new();
    for item in items {
        let (variant, product_name) =
            services::variant_with_product_name(&state.db, item.variant_id)
                .await?
                .ok_or(AppError::VariantNotFound)?;

        let ingredients = item_ingredients(state, item.id).await?;
        let line_total =
            CartItemView::compute_line_total(variant.price, &ingredients, item.quantity);

        views.push(CartItemView {
            id: item.id,
            product_name,
            variant,
            ingredients,
            quantity: item.quantity,
            line_total,
        });
    }

    let view = CartView::from_items(views);

    sqlx::query("UPDATE carts SET total_amount = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(view.total_amount)
        .bind(cart_id)
        .execute(state.db.pool())
        .await?;

    Ok(view)
}

/// Show cart; an unknown or missing token is just an empty cart
pub async fn show(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> AppResult<Json<CartView>> {
    match find_cart(&state, &jar).await? {
        Some(cart) => Ok(Json(load_cart_view(&state, cart.id).await?)),
        None => Ok(Json(CartView::empty())),
    }
}

/// Add an item; a line with the same variant and ingredient set is merged by
/// incrementing its quantity
pub async fn add(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<AddCartItemRequest>,
) -> AppResult<(CookieJar, (StatusCode, Json<CartView>))> {
    request.validate()?;

    if services::variant_with_product_name(&state.db, request.variant_id)
        .await?
        .is_none()
    {
        return Err(AppError::VariantNotFound);
    }

    let ingredient_ids = request.normalized_ingredient_ids();
    for ingredient_id in &ingredient_ids {
        let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = ?")
            .bind(ingredient_id)
            .fetch_optional(state.db.pool())
            .await?;
        if exists.is_none() {
            return Err(AppError::IngredientNotFound);
        }
    }

    // Get or create the cart for the token cookie
    let (cart, jar) = match find_cart(&state, &jar).await? {
        Some(cart) => (cart, jar),
        None => {
            let token = generate_cart_token();
            sqlx::query("INSERT INTO carts (token) VALUES (?)")
                .bind(&token)
                .execute(state.db.pool())
                .await?;
            let cart: Cart = sqlx::query_as("SELECT * FROM carts WHERE token = ?")
                .bind(&token)
                .fetch_one(state.db.pool())
                .await?;
            let jar = jar.add(cart_cookie(token, state.config.cookie_days));
            (cart, jar)
        }
    };

    // Merge with an existing line when the ingredient set matches
    let candidates: Vec<CartItem> =
        sqlx::query_as("SELECT * FROM cart_items WHERE cart_id = ? AND variant_id = ?")
            .bind(cart.id)
            .bind(request.variant_id)
            .fetch_all(state.db.pool())
            .await?;

    let mut merged = false;
    for candidate in candidates {
        let existing: Vec<i64> = item_ingredients(&state, candidate.id)
            .await?
            .into_iter()
            .map(|i| i.id)
            .collect();
        if existing == ingredient_ids {
            let quantity = (candidate.quantity + request.quantity).min(MAX_ITEM_QUANTITY);
            sqlx::query("UPDATE cart_items SET quantity = ? WHERE id = ?")
                .bind(quantity)
                .bind(candidate.id)
                .execute(state.db.pool())
                .await?;
            merged = true;
            break;
        }
    }

    if !merged {
        let result = sqlx::query("INSERT INTO cart_items (cart_id, variant_id, quantity) VALUES (?, ?, ?)")
            .bind(cart.id)
            .bind(request.variant_id)
            .bind(request.quantity)
            .execute(state.db.pool())
            .await?;
        let item_id = result.last_insert_rowid();

        for ingredient_id in &ingredient_ids {
            sqlx::query(
                "INSERT INTO cart_item_ingredients (cart_item_id, ingredient_id) VALUES (?, ?)",
            )
            .bind(item_id)
            .bind(ingredient_id)
            .execute(state.db.pool())
            .await?;
        }
    }

    let view = load_cart_view(&state, cart.id).await?;

    Ok((jar, (StatusCode::CREATED, Json(view))))
}

/// Update a line quantity
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(item_id): Path<i64>,
    Json(request): Json<UpdateCartItemRequest>,
) -> AppResult<Json<CartView>> {
    request.validate()?;

    let cart = find_cart(&state, &jar).await?.ok_or(AppError::CartNotFound)?;

    let item: Option<CartItem> =
        sqlx::query_as("SELECT * FROM cart_items WHERE id = ? AND cart_id = ?")
            .bind(item_id)
            .bind(cart.id)
            .fetch_optional(state.db.pool())
            .await?;
    let item = item.ok_or(AppError::CartItemNotFound)?;

    sqlx::query("UPDATE cart_items SET quantity = ? WHERE id = ?")
        .bind(request.quantity)
        .bind(item.id)
        .execute(state.db.pool())
        .await?;

    Ok(Json(load_cart_view(&state, cart.id).await?))
}

/// Remove a line from the cart
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(item_id): Path<i64>,
) -> AppResult<Json<CartView>> {
    let cart = find_cart(&state, &jar).await?.ok_or(AppError::CartNotFound)?;

    let item: Option<CartItem> =
        sqlx::query_as("SELECT * FROM cart_items WHERE id = ? AND cart_id = ?")
            .bind(item_id)
            .bind(cart.id)
            .fetch_optional(state.db.pool())
            .await?;
    let item = item.ok_or(AppError::CartItemNotFound)?;

    sqlx::query("DELETE FROM cart_item_ingredients WHERE cart_item_id = ?")
        .bind(item.id)
        .execute(state.db.pool())
        .await?;
    sqlx::query("DELETE FROM cart_items WHERE id = ?")
        .bind(item.id)
        .execute(state.db.pool())
        .await?;

    Ok(Json(load_cart_view(&state, cart.id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cart_tokens_are_32_hex_chars() {
        let token = generate_cart_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn cart_tokens_are_unique() {
        assert_ne!(generate_cart_token(), generate_cart_token());
    }
}
