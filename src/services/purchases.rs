//! Purchase service: supplier restocks that increment inventory

use crate::domain::purchase::{NewPurchase, Purchase};
use crate::error::AppError;
use crate::store::{Page, Store};
use std::sync::Arc;

pub struct PurchaseService {
    store: Arc<dyn Store>,
}

impl PurchaseService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn record(&self, new: NewPurchase) -> Result<Purchase, AppError> {
        if new.items.is_empty() {
            return Err(AppError::Validation("purchase must contain at least one item".into()));
        }
        for item in &new.items {
            if item.quantity < 1 {
                return Err(AppError::Validation(format!(
                    "quantity for product {} must be a positive integer",
                    item.product_id
                )));
            }
            if item.unit_cost < 0 {
                return Err(AppError::Validation(format!(
                    "unit cost for product {} must not be negative",
                    item.product_id
                )));
            }
        }
        let purchase = self.store.record_purchase(new).await?;
        tracing::info!(purchase = %purchase.id, total_cost = purchase.total_cost, "purchase recorded");
        Ok(purchase)
    }

    pub async fn list(&self, page: Page) -> Result<(Vec<Purchase>, i64), AppError> {
        self.store.purchases(page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::NewProduct;
    use crate::domain::purchase::NewPurchaseItem;
    use crate::store::MemStore;
    use uuid::Uuid;

    #[tokio::test]
    async fn restock_increments_inventory() {
        let store = Arc::new(MemStore::new());
        let product = store
            .insert_product(NewProduct { name: "Yerba".into(), price: 1_500, stock: 3, ..Default::default() })
            .await
            .unwrap();
        let service = PurchaseService::new(store.clone());

        let purchase = service
            .record(NewPurchase {
                supplier: Some("Distribuidora Sur".into()),
                notes: None,
                items: vec![NewPurchaseItem { product_id: product.id, quantity: 12, unit_cost: 900 }],
            })
            .await
            .unwrap();

        assert_eq!(purchase.total_cost, 10_800);
        assert_eq!(store.product(product.id).await.unwrap().unwrap().stock, 15);
    }

    #[tokio::test]
    async fn unknown_product_is_rejected() {
        let store = Arc::new(MemStore::new());
        let service = PurchaseService::new(store);
        let err = service
            .record(NewPurchase {
                supplier: None,
                notes: None,
                items: vec![NewPurchaseItem { product_id: Uuid::new_v4(), quantity: 1, unit_cost: 10 }],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
