use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Catalog category
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Product model
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub image_url: String,
    pub sku: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A purchasable variant of a product (size / dough kind / price point)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductVariant {
    pub id: i64,
    pub product_id: i64,
    pub price: i64,
    pub size: Option<i64>,
    pub kind: Option<i64>,
    pub sku: Option<String>,
}

/// Optional extra that can be added to a product
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub image_url: String,
    pub sku: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Product with its variants and selectable ingredients
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<ProductVariant>,
    pub ingredients: Vec<Ingredient>,
}

/// Category with its (already pruned) products
#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub id: i64,
    pub name: String,
    pub products: Vec<ProductView>,
}

/// Product detail response: the product plus its category siblings
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: ProductView,
    pub category: CategoryView,
}

/// Search/filter parameters for the catalog listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    /// Branch override; takes precedence over the cookie
    pub city: Option<String>,
    pub query: Option<String>,
    /// Comma-separated variant sizes
    pub sizes: Option<String>,
    /// Comma-separated variant kinds
    pub kinds: Option<String>,
    /// Comma-separated ingredient ids
    pub ingredients: Option<String>,
    pub price_from: Option<i64>,
    pub price_to: Option<i64>,
}

fn parse_id_list(raw: &Option<String>) -> Vec<i64> {
    raw.as_deref()
        .map(|s| {
            s.split(',')
                .filter_map(|part| part.trim().parse::<i64>().ok())
                .collect()
        })
        .unwrap_or_default()
}

impl CatalogQuery {
    pub fn sizes(&self) -> Vec<i64> {
        parse_id_list(&self.sizes)
    }

    pub fn kinds(&self) -> Vec<i64> {
        parse_id_list(&self.kinds)
    }

    pub fn ingredient_ids(&self) -> Vec<i64> {
        parse_id_list(&self.ingredients)
    }

    /// Effective price range, falling back to the configured defaults
    pub fn price_range(&self, default_min: i64, default_max: i64) -> (i64, i64) {
        (
            self.price_from.unwrap_or(default_min),
            self.price_to.unwrap_or(default_max),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_lists() {
        let query = CatalogQuery {
            sizes: Some("20,30,40".to_string()),
            kinds: Some("1, 2".to_string()),
            ..Default::default()
        };

        assert_eq!(query.sizes(), vec![20, 30, 40]);
        assert_eq!(query.kinds(), vec![1, 2]);
        assert!(query.ingredient_ids().is_empty());
    }

    #[test]
    fn skips_malformed_list_entries() {
        let query = CatalogQuery {
            ingredients: Some("5,abc,,7".to_string()),
            ..Default::default()
        };

        assert_eq!(query.ingredient_ids(), vec![5, 7]);
    }

    #[test]
    fn price_range_falls_back_to_defaults() {
        let query = CatalogQuery {
            price_to: Some(500),
            ..Default::default()
        };

        assert_eq!(query.price_range(0, 1000), (0, 500));
        assert_eq!(CatalogQuery::default().price_range(0, 1000), (0, 1000));
    }
}
