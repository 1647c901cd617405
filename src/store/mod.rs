//! Data access layer: thin async wrappers around the relational backend
//!
//! Everything behind an object-safe trait so the service layer and the
//! integration tests can run against either Postgres or the in-memory
//! backend.

mod mem;
mod pg;

pub use mem::MemStore;
pub use pg::PgStore;

use crate::domain::order::{NewOrder, Order, OrderStatus};
use crate::domain::product::{NewProduct, Product, ProductPatch};
use crate::domain::profile::Profile;
use crate::domain::purchase::{NewPurchase, Purchase};
use crate::error::AppError;
use async_trait::async_trait;
use uuid::Uuid;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

#[derive(Clone, Copy, Debug)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Page {
    pub fn clamped(offset: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            offset: offset.unwrap_or(0).max(0),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    // products
    async fn insert_product(&self, new: NewProduct) -> Result<Product, AppError>;
    async fn product(&self, id: Uuid) -> Result<Option<Product>, AppError>;
    async fn product_by_sku(&self, sku: &str) -> Result<Option<Product>, AppError>;
    async fn products(&self, page: Page) -> Result<(Vec<Product>, i64), AppError>;
    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>, AppError>;
    /// Returns the deleted row so the caller can purge its stored images.
    async fn delete_product(&self, id: Uuid) -> Result<Option<Product>, AppError>;

    /// Atomic order placement: validates every line against live stock,
    /// decrements stock conditionally and persists the order with its
    /// computed profit. Fails with `AppError::Stock` listing every faulting
    /// line, in which case no stock is touched.
    async fn create_order(&self, new: NewOrder) -> Result<Order, AppError>;
    async fn orders(&self, page: Page) -> Result<(Vec<Order>, i64), AppError>;
    async fn order(&self, id: Uuid) -> Result<Option<Order>, AppError>;
    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> Result<Option<Order>, AppError>;
    async fn delete_order(&self, id: Uuid) -> Result<bool, AppError>;

    // profiles (written by the managed auth provider, read for the role gate)
    async fn profile(&self, id: Uuid) -> Result<Option<Profile>, AppError>;

    // purchases
    async fn record_purchase(&self, new: NewPurchase) -> Result<Purchase, AppError>;
    async fn purchases(&self, page: Page) -> Result<(Vec<Purchase>, i64), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_clamps_inputs() {
        let page = Page::clamped(None, None);
        assert_eq!((page.offset, page.limit), (0, DEFAULT_LIMIT));

        let page = Page::clamped(Some(-5), Some(10_000));
        assert_eq!((page.offset, page.limit), (0, MAX_LIMIT));

        let page = Page::clamped(Some(40), Some(0));
        assert_eq!((page.offset, page.limit), (40, 1));
    }
}
