use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Branch model (a physical outlet with its own stop list)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Branch {
    pub id: String,
    pub external_id: String,
    pub name: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
}

/// Stop-list row: a SKU currently unavailable at a branch
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StopListEntry {
    pub id: i64,
    pub branch_id: String,
    pub sku: String,
    pub balance: i64,
    pub updated_at: DateTime<Utc>,
}

/// Select branch request
#[derive(Debug, Clone, Deserialize)]
pub struct SelectBranchRequest {
    pub branch_id: String,
}
