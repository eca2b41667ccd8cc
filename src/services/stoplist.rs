//! Stop-list propagation: prune the catalog tree for a branch by dropping
//! everything whose SKU is on that branch's stop list, then suppressing
//! parents left empty.

use std::collections::HashSet;

use crate::db::Database;
use crate::error::AppResult;
use crate::models::{CategoryView, ProductView};

/// Fetch the set of SKUs excluded for a branch. Blank SKUs on the stop list
/// never exclude anything.
pub async fn excluded_skus(db: &Database, branch_id: &str) -> AppResult<HashSet<String>> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT sku FROM stop_list WHERE branch_id = ?")
        .bind(branch_id)
        .fetch_all(db.pool())
        .await?;

    Ok(rows
        .into_iter()
        .map(|(sku,)| sku.trim().to_string())
        .filter(|sku| !sku.is_empty())
        .collect())
}

/// A row with a missing or blank SKU cannot be stop-listed
pub fn is_excluded(sku: Option<&str>, excluded: &HashSet<String>) -> bool {
    match sku.map(str::trim) {
        Some(s) if !s.is_empty() => excluded.contains(s),
        _ => false,
    }
}

/// Drop excluded variants and ingredients from a single product
pub fn prune_product(mut product: ProductView, excluded: &HashSet<String>) -> ProductView {
    product
        .variants
        .retain(|v| !is_excluded(v.sku.as_deref(), excluded));
    product
        .ingredients
        .retain(|i| !is_excluded(i.sku.as_deref(), excluded));
    product
}

/// Prune the full category tree:
/// variants and ingredients by SKU, then products that are stop-listed
/// themselves or left without variants, then categories left empty.
pub fn prune(categories: Vec<CategoryView>, excluded: &HashSet<String>) -> Vec<CategoryView> {
    categories
        .into_iter()
        .map(|mut category| {
            category.products = category
                .products
                .into_iter()
                .filter(|p| !is_excluded(p.product.sku.as_deref(), excluded))
                .map(|p| prune_product(p, excluded))
                .filter(|p| !p.variants.is_empty())
                .collect();
            category
        })
        .filter(|category| !category.products.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Ingredient, Product, ProductVariant};
    use chrono::Utc;

    fn product(id: i64, sku: Option<&str>) -> Product {
        Product {
            id,
            category_id: 1,
            name: format!("product-{}", id),
            image_url: String::new(),
            sku: sku.map(String::from),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn variant(id: i64, sku: Option<&str>) -> ProductVariant {
        ProductVariant {
            id,
            product_id: 1,
            price: 100,
            size: None,
            kind: None,
            sku: sku.map(String::from),
        }
    }

    fn ingredient(id: i64, sku: Option<&str>) -> Ingredient {
        Ingredient {
            id,
            name: format!("ingredient-{}", id),
            price: 30,
            image_url: String::new(),
            sku: sku.map(String::from),
            created_at: Utc::now(),
        }
    }

    fn view(product: Product, variants: Vec<ProductVariant>, ingredients: Vec<Ingredient>) -> ProductView {
        ProductView {
            product,
            variants,
            ingredients,
        }
    }

    fn excluded(skus: &[&str]) -> HashSet<String> {
        skus.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn blank_and_missing_skus_are_never_excluded() {
        let set = excluded(&["A-1", ""]);
        assert!(!is_excluded(None, &set));
        assert!(!is_excluded(Some(""), &set));
        assert!(!is_excluded(Some("   "), &set));
        assert!(is_excluded(Some("A-1"), &set));
    }

    #[test]
    fn drops_excluded_variants_and_ingredients() {
        let p = view(
            product(1, None),
            vec![variant(1, Some("V-1")), variant(2, Some("V-2"))],
            vec![ingredient(1, Some("I-1")), ingredient(2, None)],
        );

        let pruned = prune_product(p, &excluded(&["V-1", "I-1"]));

        assert_eq!(pruned.variants.len(), 1);
        assert_eq!(pruned.variants[0].id, 2);
        assert_eq!(pruned.ingredients.len(), 1);
        assert_eq!(pruned.ingredients[0].id, 2);
    }

    #[test]
    fn suppresses_product_with_no_variants_left() {
        let categories = vec![CategoryView {
            id: 1,
            name: "Pizza".to_string(),
            products: vec![
                view(product(1, None), vec![variant(1, Some("V-1"))], vec![]),
                view(product(2, None), vec![variant(2, Some("V-2"))], vec![]),
            ],
        }];

        let pruned = prune(categories, &excluded(&["V-1"]));

        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].products.len(), 1);
        assert_eq!(pruned[0].products[0].product.id, 2);
    }

    #[test]
    fn suppresses_stop_listed_product_itself() {
        let categories = vec![CategoryView {
            id: 1,
            name: "Pizza".to_string(),
            products: vec![view(
                product(1, Some("P-1")),
                vec![variant(1, None)],
                vec![],
            )],
        }];

        assert!(prune(categories, &excluded(&["P-1"])).is_empty());
    }

    #[test]
    fn suppresses_emptied_category() {
        let categories = vec![
            CategoryView {
                id: 1,
                name: "Pizza".to_string(),
                products: vec![view(product(1, None), vec![variant(1, Some("V-1"))], vec![])],
            },
            CategoryView {
                id: 2,
                name: "Drinks".to_string(),
                products: vec![view(product(2, None), vec![variant(2, None)], vec![])],
            },
        ];

        let pruned = prune(categories, &excluded(&["V-1"]));

        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].id, 2);
    }

    #[test]
    fn empty_exclusion_set_is_identity() {
        let categories = vec![CategoryView {
            id: 1,
            name: "Pizza".to_string(),
            products: vec![view(
                product(1, Some("P-1")),
                vec![variant(1, Some("V-1"))],
                vec![ingredient(1, Some("I-1"))],
            )],
        }];

        let pruned = prune(categories.clone(), &HashSet::new());

        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].products.len(), 1);
        assert_eq!(pruned[0].products[0].variants.len(), 1);
        assert_eq!(pruned[0].products[0].ingredients.len(), 1);
    }

    #[test]
    fn pruning_is_idempotent() {
        let categories = vec![CategoryView {
            id: 1,
            name: "Pizza".to_string(),
            products: vec![
                view(
                    product(1, None),
                    vec![variant(1, Some("V-1")), variant(2, None)],
                    vec![ingredient(1, Some("I-1"))],
                ),
                view(product(2, None), vec![variant(3, Some("V-3"))], vec![]),
            ],
        }];
        let set = excluded(&["V-1", "I-1", "V-3"]);

        let once = prune(categories, &set);
        let twice = prune(once.clone(), &set);

        assert_eq!(once.len(), twice.len());
        assert_eq!(once[0].products.len(), twice[0].products.len());
    }
}
