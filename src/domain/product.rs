//! Product records and the SKU value object

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// SKU (Stock Keeping Unit) value object. Normalized to trimmed uppercase.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sku(String);

impl Sku {
    pub fn new(value: impl Into<String>) -> Result<Self, SkuError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() {
            return Err(SkuError::Empty);
        }
        if value.len() > 50 {
            return Err(SkuError::TooLong);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkuError {
    #[error("SKU empty")]
    Empty,
    #[error("SKU too long")]
    TooLong,
}

/// Catalog product. Prices are integer minor units; `stock` never observably
/// drops below zero.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub sku: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub cost_price: Option<i64>,
    pub override_price: Option<i64>,
    pub stock: i32,
    pub category: Option<String>,
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub sku: Option<Sku>,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub cost_price: Option<i64>,
    pub override_price: Option<i64>,
    pub stock: i32,
    pub category: Option<String>,
    pub image_urls: Vec<String>,
}

/// Partial update. Absent fields are left untouched; `add_image_urls` are
/// appended to the stored list.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub sku: Option<Sku>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub cost_price: Option<i64>,
    pub override_price: Option<i64>,
    pub stock: Option<i32>,
    pub category: Option<String>,
    pub add_image_urls: Vec<String>,
}

/// Storefront projection: everything the public catalog shows, without the
/// wholesale cost columns.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogView {
    pub id: Uuid,
    pub sku: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock: i32,
    pub category: Option<String>,
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Product> for CatalogView {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            sku: p.sku.clone(),
            name: p.name.clone(),
            description: p.description.clone(),
            price: p.price,
            stock: p.stock,
            category: p.category.clone(),
            image_urls: p.image_urls.clone(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Restricted projection served to resellers (`modo=costosPrivados`).
#[derive(Debug, Clone, Serialize)]
pub struct CostView {
    pub id: Uuid,
    pub sku: Option<String>,
    pub name: String,
    pub cost_price: Option<i64>,
}

impl From<&Product> for CostView {
    fn from(p: &Product) -> Self {
        Self { id: p.id, sku: p.sku.clone(), name: p.name.clone(), cost_price: p.cost_price }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sku_normalizes() {
        let sku = Sku::new("  prod-001 ").unwrap();
        assert_eq!(sku.as_str(), "PROD-001");
    }

    #[test]
    fn sku_rejects_empty_and_oversized() {
        assert_eq!(Sku::new("   "), Err(SkuError::Empty));
        assert_eq!(Sku::new("x".repeat(51)), Err(SkuError::TooLong));
    }
}
