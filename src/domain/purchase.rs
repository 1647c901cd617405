//! Supplier purchases: the manual restock entry that increments stock

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PurchaseItem {
    pub id: Uuid,
    pub purchase_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_cost: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub id: Uuid,
    pub supplier: Option<String>,
    pub notes: Option<String>,
    pub total_cost: i64,
    pub items: Vec<PurchaseItem>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub supplier: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<NewPurchaseItem>,
}

#[derive(Debug, Clone)]
pub struct NewPurchaseItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_cost: i64,
}

impl NewPurchase {
    pub fn total_cost(&self) -> i64 {
        self.items.iter().map(|i| i.unit_cost * i64::from(i.quantity)).sum()
    }
}
