use std::collections::HashSet;

use sqlx::sqlite::SqliteRow;

use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{
    CatalogQuery, Category, CategoryView, Ingredient, Product, ProductDetail, ProductVariant,
    ProductView,
};
use crate::services::stoplist;

/// `AND (col IS NULL OR col NOT IN (?, ...))`; empty when nothing is excluded
fn sku_exclusion_clause(column: &str, excluded_count: usize) -> String {
    if excluded_count == 0 {
        return String::new();
    }
    let placeholders = vec!["?"; excluded_count].join(", ");
    format!(" AND ({column} IS NULL OR {column} NOT IN ({placeholders}))")
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

async fn product_ingredients(db: &Database, product_id: i64) -> AppResult<Vec<Ingredient>> {
    let ingredients: Vec<Ingredient> = sqlx::query_as(
        "SELECT i.* FROM ingredients i \
         JOIN product_ingredients pi ON pi.ingredient_id = i.id \
         WHERE pi.product_id = ? ORDER BY i.id",
    )
    .bind(product_id)
    .fetch_all(db.pool())
    .await?;

    Ok(ingredients)
}

/// Load the catalog tree for a branch, applying the search filters SQL-side
/// where affordable and the stop-list prune in memory as the authority.
pub async fn find_catalog(
    db: &Database,
    branch_id: &str,
    query: &CatalogQuery,
    default_min_price: i64,
    default_max_price: i64,
) -> AppResult<Vec<CategoryView>> {
    let excluded = stoplist::excluded_skus(db, branch_id).await?;
    // Stable bind order for the NOT IN placeholders
    let mut excluded_list: Vec<String> = excluded.iter().cloned().collect();
    excluded_list.sort();

    let (min_price, max_price) = query.price_range(default_min_price, default_max_price);
    let sizes = query.sizes();
    let kinds = query.kinds();
    let ingredient_ids = query.ingredient_ids();
    let name_pattern = query
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{}%", q));

    let categories: Vec<Category> = sqlx::query_as("SELECT * FROM categories ORDER BY id")
        .fetch_all(db.pool())
        .await?;

    let mut tree = Vec::new();

    for category in categories {
        let mut sql = String::from("SELECT * FROM products WHERE category_id = ?");
        sql.push_str(&sku_exclusion_clause("sku", excluded_list.len()));
        if name_pattern.is_some() {
            sql.push_str(" AND name LIKE ?");
        }
        if !ingredient_ids.is_empty() {
            sql.push_str(&format!(
                " AND id IN (SELECT product_id FROM product_ingredients WHERE ingredient_id IN ({}))",
                join_ids(&ingredient_ids)
            ));
        }
        sql.push_str(" ORDER BY id DESC");

        let mut products_query = sqlx::query_as::<_, Product>(&sql).bind(category.id);
        for sku in &excluded_list {
            products_query = products_query.bind(sku);
        }
        if let Some(ref pattern) = name_pattern {
            products_query = products_query.bind(pattern);
        }
        let products = products_query.fetch_all(db.pool()).await?;

        let mut views = Vec::new();
        for product in products {
            let mut vsql = String::from(
                "SELECT * FROM product_variants WHERE product_id = ? AND price >= ? AND price <= ?",
            );
            vsql.push_str(&sku_exclusion_clause("sku", excluded_list.len()));
            if !sizes.is_empty() {
                vsql.push_str(&format!(" AND size IN ({})", join_ids(&sizes)));
            }
            if !kinds.is_empty() {
                vsql.push_str(&format!(" AND kind IN ({})", join_ids(&kinds)));
            }
            vsql.push_str(" ORDER BY price ASC");

            let mut variants_query = sqlx::query_as::<_, ProductVariant>(&vsql)
                .bind(product.id)
                .bind(min_price)
                .bind(max_price);
            for sku in &excluded_list {
                variants_query = variants_query.bind(sku);
            }
            let variants = variants_query.fetch_all(db.pool()).await?;

            // All ingredients; the prune below filters them by SKU
            let ingredients = product_ingredients(db, product.id).await?;

            views.push(ProductView {
                product,
                variants,
                ingredients,
            });
        }

        tree.push(CategoryView {
            id: category.id,
            name: category.name,
            products: views,
        });
    }

    Ok(stoplist::prune(tree, &excluded))
}

/// Load a single product with variants, ingredients and category siblings,
/// all pruned against the branch exclusion set.
pub async fn product_detail(
    db: &Database,
    product_id: i64,
    excluded: &HashSet<String>,
) -> AppResult<ProductDetail> {
    let product: Product = sqlx::query_as("SELECT * FROM products WHERE id = ?")
        .bind(product_id)
        .fetch_optional(db.pool())
        .await?
        .ok_or(AppError::ProductNotFound)?;

    // A stop-listed product is indistinguishable from a missing one
    if stoplist::is_excluded(product.sku.as_deref(), excluded) {
        return Err(AppError::ProductNotFound);
    }

    let variants: Vec<ProductVariant> =
        sqlx::query_as("SELECT * FROM product_variants WHERE product_id = ? ORDER BY price ASC")
            .bind(product.id)
            .fetch_all(db.pool())
            .await?;

    let ingredients = product_ingredients(db, product.id).await?;

    let view = stoplist::prune_product(
        ProductView {
            product,
            variants,
            ingredients,
        },
        excluded,
    );

    if view.variants.is_empty() {
        return Err(AppError::ProductUnavailable);
    }

    let category: Category = sqlx::query_as("SELECT * FROM categories WHERE id = ?")
        .bind(view.product.category_id)
        .fetch_one(db.pool())
        .await?;

    // Siblings shown alongside the product, pruned the same way
    let sibling_rows: Vec<Product> =
        sqlx::query_as("SELECT * FROM products WHERE category_id = ? ORDER BY id DESC")
            .bind(category.id)
            .fetch_all(db.pool())
            .await?;

    let mut siblings = Vec::new();
    for sibling in sibling_rows {
        let variants: Vec<ProductVariant> =
            sqlx::query_as("SELECT * FROM product_variants WHERE product_id = ? ORDER BY price ASC")
                .bind(sibling.id)
                .fetch_all(db.pool())
                .await?;
        siblings.push(ProductView {
            product: sibling,
            variants,
            ingredients: Vec::new(),
        });
    }

    let category_view = CategoryView {
        id: category.id,
        name: category.name,
        products: stoplist::prune(
            vec![CategoryView {
                id: category.id,
                name: String::new(),
                products: siblings,
            }],
            excluded,
        )
        .pop()
        .map(|c| c.products)
        .unwrap_or_default(),
    };

    Ok(ProductDetail {
        product: view,
        category: category_view,
    })
}

/// Look up a variant together with its product name (cart display)
pub async fn variant_with_product_name(
    db: &Database,
    variant_id: i64,
) -> AppResult<Option<(ProductVariant, String)>> {
    use sqlx::Row;

    let row: Option<SqliteRow> = sqlx::query(
        "SELECT v.id, v.product_id, v.price, v.size, v.kind, v.sku, p.name AS product_name \
         FROM product_variants v JOIN products p ON p.id = v.product_id WHERE v.id = ?",
    )
    .bind(variant_id)
    .fetch_optional(db.pool())
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let variant = ProductVariant {
        id: row.try_get("id")?,
        product_id: row.try_get("product_id")?,
        price: row.try_get("price")?,
        size: row.try_get("size")?,
        kind: row.try_get("kind")?,
        sku: row.try_get("sku")?,
    };
    let product_name: String = row.try_get("product_name")?;

    Ok(Some((variant, product_name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusion_clause_is_empty_without_exclusions() {
        assert_eq!(sku_exclusion_clause("sku", 0), "");
    }

    #[test]
    fn exclusion_clause_keeps_null_skus() {
        let clause = sku_exclusion_clause("sku", 2);
        assert_eq!(clause, " AND (sku IS NULL OR sku NOT IN (?, ?))");
    }

    #[test]
    fn joins_ids_for_in_lists() {
        assert_eq!(join_ids(&[20, 30, 40]), "20, 30, 40");
        assert_eq!(join_ids(&[]), "");
    }
}
