use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{Ingredient, ProductVariant};
use crate::error::{AppError, AppResult};

pub const MAX_ITEM_QUANTITY: i64 = 99;

/// Cart model, correlated to the browser via the token cookie
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Cart {
    pub id: i64,
    pub token: String,
    pub user_id: Option<i64>,
    pub total_amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cart item row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub variant_id: i64,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

/// Cart item with variant and ingredient details (for display)
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub id: i64,
    pub product_name: String,
    pub variant: ProductVariant,
    pub ingredients: Vec<Ingredient>,
    pub quantity: i64,
    pub line_total: i64,
}

impl CartItemView {
    /// (variant price + ingredient prices) x quantity
    pub fn compute_line_total(
        variant_price: i64,
        ingredients: &[Ingredient],
        quantity: i64,
    ) -> i64 {
        let extras: i64 = ingredients.iter().map(|i| i.price).sum();
        (variant_price + extras) * quantity
    }
}

/// Full cart response
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total_amount: i64,
}

impl CartView {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_amount: 0,
        }
    }

    pub fn from_items(items: Vec<CartItemView>) -> Self {
        let total_amount = items.iter().map(|i| i.line_total).sum();
        Self {
            items,
            total_amount,
        }
    }
}

/// Add item to cart request
#[derive(Debug, Clone, Deserialize)]
pub struct AddCartItemRequest {
    pub variant_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub ingredient_ids: Vec<i64>,
}

fn default_quantity() -> i64 {
    1
}

impl AddCartItemRequest {
    pub fn validate(&self) -> AppResult<()> {
        validate_quantity(self.quantity)
    }

    /// Sorted, de-duplicated ingredient ids; two selections with the same
    /// normalized set are the same cart line
    pub fn normalized_ingredient_ids(&self) -> Vec<i64> {
        let mut ids = self.ingredient_ids.clone();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Update cart item quantity request
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i64,
}

impl UpdateCartItemRequest {
    pub fn validate(&self) -> AppResult<()> {
        validate_quantity(self.quantity)
    }
}

fn validate_quantity(quantity: i64) -> AppResult<()> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&quantity) {
        return Err(AppError::InvalidInput(format!(
            "quantity must be between 1 and {}",
            MAX_ITEM_QUANTITY
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ingredient(id: i64, price: i64) -> Ingredient {
        Ingredient {
            id,
            name: format!("extra-{}", id),
            price,
            image_url: String::new(),
            sku: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn line_total_includes_ingredients_and_quantity() {
        let extras = vec![ingredient(1, 30), ingredient(2, 50)];
        assert_eq!(CartItemView::compute_line_total(500, &extras, 2), 1160);
        assert_eq!(CartItemView::compute_line_total(500, &[], 1), 500);
    }

    #[test]
    fn cart_total_is_sum_of_line_totals() {
        let variant = ProductVariant {
            id: 1,
            product_id: 1,
            price: 400,
            size: Some(30),
            kind: None,
            sku: None,
        };
        let items = vec![
            CartItemView {
                id: 1,
                product_name: "One".to_string(),
                variant: variant.clone(),
                ingredients: vec![],
                quantity: 2,
                line_total: 800,
            },
            CartItemView {
                id: 2,
                product_name: "Two".to_string(),
                variant,
                ingredients: vec![],
                quantity: 1,
                line_total: 400,
            },
        ];

        assert_eq!(CartView::from_items(items).total_amount, 1200);
        assert_eq!(CartView::empty().total_amount, 0);
    }

    #[test]
    fn normalized_ingredients_sort_and_dedup() {
        let request = AddCartItemRequest {
            variant_id: 1,
            quantity: 1,
            ingredient_ids: vec![7, 3, 7, 1],
        };

        assert_eq!(request.normalized_ingredient_ids(), vec![1, 3, 7]);
    }

    #[test]
    fn quantity_bounds_are_enforced() {
        let mut request = AddCartItemRequest {
            variant_id: 1,
            quantity: 0,
            ingredient_ids: vec![],
        };
        assert!(request.validate().is_err());

        request.quantity = 1;
        assert!(request.validate().is_ok());

        request.quantity = MAX_ITEM_QUANTITY + 1;
        assert!(request.validate().is_err());
    }
}
