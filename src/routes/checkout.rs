use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::CookieJar;

use crate::error::{AppError, AppResult};
use crate::models::{
    Branch, Cart, CheckoutRequest, CheckoutResponse, Order, OrderItemSnapshot, OrderStatus,
};
use crate::routes::cart::load_cart_view;
use crate::services::TelegramNotifier;
use crate::AppState;

const CART_COOKIE: &str = "cart_token";

/// Create an order from the cart behind the token cookie, clear the cart,
/// and notify staff via the chat bot (best-effort)
pub async fn create(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<CheckoutResponse>)> {
    request.validate()?;

    let token = jar
        .get(CART_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(AppError::CartNotFound)?;

    let cart: Cart = sqlx::query_as("SELECT * FROM carts WHERE token = ?")
        .bind(&token)
        .fetch_optional(state.db.pool())
        .await?
        .ok_or(AppError::CartNotFound)?;

    let view = load_cart_view(&state, cart.id).await?;
    if view.items.is_empty() || view.total_amount == 0 {
        return Err(AppError::CartEmpty);
    }

    let branch: Branch = sqlx::query_as("SELECT * FROM branches WHERE id = ?")
        .bind(&request.branch_id)
        .fetch_optional(state.db.pool())
        .await?
        .ok_or(AppError::BranchNotFound)?;

    // Snapshot the cart onto the order before the cart is cleared
    let snapshots: Vec<OrderItemSnapshot> = view
        .items
        .iter()
        .map(|item| OrderItemSnapshot {
            product_name: item.product_name.clone(),
            size: item.variant.size,
            quantity: item.quantity,
            ingredients: item.ingredients.iter().map(|i| i.name.clone()).collect(),
            line_total: item.line_total,
        })
        .collect();
    let items_json = serde_json::to_string(&snapshots)
        .map_err(|e| AppError::Internal(format!("Failed to serialize order items: {}", e)))?;

    let status: String = OrderStatus::Succeeded.into();
    let delivery_type: String = request.delivery_type.into();
    let payment_method: String = request.payment_method.into();

    // Order insert and cart clearing are one transaction
    let mut tx = state.db.pool().begin().await?;

    let result = sqlx::query(
        "INSERT INTO orders (token, full_name, phone, address, branch_id, branch_name, comment, \
         delivery_type, payment_method, total_amount, status, items) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&token)
    .bind(request.first_name.trim())
    .bind(request.phone.trim())
    .bind(request.address.as_deref().unwrap_or("").trim())
    .bind(&branch.id)
    .bind(&branch.name)
    .bind(&request.comment)
    .bind(&delivery_type)
    .bind(&payment_method)
    .bind(view.total_amount)
    .bind(&status)
    .bind(&items_json)
    .execute(&mut *tx)
    .await?;
    let order_id = result.last_insert_rowid();

    sqlx::query("UPDATE carts SET total_amount = 0, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(cart.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        "DELETE FROM cart_item_ingredients WHERE cart_item_id IN \
         (SELECT id FROM cart_items WHERE cart_id = ?)",
    )
    .bind(cart.id)
    .execute(&mut *tx)
    .await?;
    sqlx::query("DELETE FROM cart_items WHERE cart_id = ?")
        .bind(cart.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    let order: Order = sqlx::query_as("SELECT * FROM orders WHERE id = ?")
        .bind(order_id)
        .fetch_one(state.db.pool())
        .await?;

    tracing::info!(
        order_id,
        branch = %branch.name,
        total = order.total_amount,
        "Order created"
    );

    // Fire-and-forget staff notification; a webhook failure never fails the
    // checkout
    let message = TelegramNotifier::format_order_message(&order, &snapshots);
    let notifier_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = notifier_state.notifier.send_message(&message).await {
            tracing::warn!(order_id, "Order notification failed: {}", e);
        }
    });

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            order_id,
            total_amount: order.total_amount,
        }),
    ))
}
