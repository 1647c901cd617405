//! In-memory backend
//!
//! Backs the integration tests and local development without a database.
//! A single mutex held across order placement gives the same no-oversell
//! guarantee the Postgres backend gets from its transaction.

use super::{Page, Store};
use crate::domain::order::{self, NewOrder, Order, OrderItem, OrderStatus};
use crate::domain::product::{NewProduct, Product, ProductPatch};
use crate::domain::profile::Profile;
use crate::domain::purchase::{NewPurchase, Purchase, PurchaseItem};
use crate::error::{AppError, StockFault};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    products: HashMap<Uuid, Product>,
    orders: Vec<Order>,
    profiles: HashMap<Uuid, Profile>,
    purchases: Vec<Purchase>,
}

#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_product(&self, product: Product) {
        self.inner.lock().await.products.insert(product.id, product);
    }

    pub async fn seed_profile(&self, profile: Profile) {
        self.inner.lock().await.profiles.insert(profile.id, profile);
    }
}

fn paginate<T: Clone>(rows: &[T], page: Page) -> Vec<T> {
    rows.iter()
        .skip(page.offset.max(0) as usize)
        .take(page.limit.max(0) as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl Store for MemStore {
    async fn insert_product(&self, new: NewProduct) -> Result<Product, AppError> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::now_v7(),
            sku: new.sku.map(|s| s.into_string()),
            name: new.name,
            description: new.description,
            price: new.price,
            cost_price: new.cost_price,
            override_price: new.override_price,
            stock: new.stock,
            category: new.category,
            image_urls: new.image_urls,
            created_at: now,
            updated_at: now,
        };
        self.inner.lock().await.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        Ok(self.inner.lock().await.products.get(&id).cloned())
    }

    async fn product_by_sku(&self, sku: &str) -> Result<Option<Product>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.products.values().find(|p| p.sku.as_deref() == Some(sku)).cloned())
    }

    async fn products(&self, page: Page) -> Result<(Vec<Product>, i64), AppError> {
        let inner = self.inner.lock().await;
        let mut all: Vec<Product> = inner.products.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = all.len() as i64;
        Ok((paginate(&all, page), total))
    }

    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>, AppError> {
        let mut inner = self.inner.lock().await;
        let Some(product) = inner.products.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(sku) = patch.sku {
            product.sku = Some(sku.into_string());
        }
        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(description) = patch.description {
            product.description = Some(description);
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(cost_price) = patch.cost_price {
            product.cost_price = Some(cost_price);
        }
        if let Some(override_price) = patch.override_price {
            product.override_price = Some(override_price);
        }
        if let Some(stock) = patch.stock {
            product.stock = stock;
        }
        if let Some(category) = patch.category {
            product.category = Some(category);
        }
        product.image_urls.extend(patch.add_image_urls);
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        Ok(self.inner.lock().await.products.remove(&id))
    }

    async fn create_order(&self, new: NewOrder) -> Result<Order, AppError> {
        let mut inner = self.inner.lock().await;

        // Validation pass over all lines; nothing is mutated on this branch.
        let mut faults = Vec::new();
        for item in &new.items {
            match inner.products.get(&item.product_id) {
                None => faults.push(StockFault::not_found(item.product_id)),
                Some(p) if p.stock < item.quantity => {
                    faults.push(StockFault::insufficient(item.product_id, p.stock))
                }
                Some(_) => {}
            }
        }
        if !faults.is_empty() {
            return Err(AppError::Stock(faults));
        }

        // Commit pass: conditional decrement mirrors the database backend so
        // duplicate lines summing past stock still cannot oversell.
        let mut profit = 0i64;
        let mut decremented: Vec<(Uuid, i32)> = Vec::new();
        for item in &new.items {
            let product = inner
                .products
                .get_mut(&item.product_id)
                .ok_or_else(|| AppError::Internal("product vanished during commit".into()))?;
            if product.stock < item.quantity {
                let available = product.stock;
                for (id, qty) in decremented {
                    if let Some(p) = inner.products.get_mut(&id) {
                        p.stock += qty;
                    }
                }
                return Err(AppError::Stock(vec![StockFault::insufficient(item.product_id, available)]));
            }
            product.stock -= item.quantity;
            product.updated_at = Utc::now();
            decremented.push((item.product_id, item.quantity));
            profit += order::line_profit(item.unit_price, product.cost_price, item.quantity);
        }

        let now = Utc::now();
        let order_id = Uuid::now_v7();
        let items: Vec<OrderItem> = new
            .items
            .iter()
            .enumerate()
            .map(|(position, item)| OrderItem {
                id: Uuid::now_v7(),
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
                position: position as i32,
            })
            .collect();
        let order = Order {
            id: order_id,
            order_number: order::order_number(),
            user_id: new.user_id,
            status: OrderStatus::Pending,
            total: new.total,
            profit,
            payment_method: new.payment_method,
            shipping_address: new.shipping_address,
            shipping_method: new.shipping_method,
            customer_name: new.customer_name,
            customer_email: new.customer_email,
            customer_phone: new.customer_phone,
            notes: new.notes,
            items,
            created_at: now,
            updated_at: now,
        };
        inner.orders.push(order.clone());
        Ok(order)
    }

    async fn orders(&self, page: Page) -> Result<(Vec<Order>, i64), AppError> {
        let inner = self.inner.lock().await;
        let mut all: Vec<Order> = inner.orders.iter().rev().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = all.len() as i64;
        Ok((paginate(&all, page), total))
    }

    async fn order(&self, id: Uuid) -> Result<Option<Order>, AppError> {
        Ok(self.inner.lock().await.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> Result<Option<Order>, AppError> {
        let mut inner = self.inner.lock().await;
        let Some(order) = inner.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };
        order.status = status;
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn delete_order(&self, id: Uuid) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().await;
        let before = inner.orders.len();
        inner.orders.retain(|o| o.id != id);
        Ok(inner.orders.len() < before)
    }

    async fn profile(&self, id: Uuid) -> Result<Option<Profile>, AppError> {
        Ok(self.inner.lock().await.profiles.get(&id).cloned())
    }

    async fn record_purchase(&self, new: NewPurchase) -> Result<Purchase, AppError> {
        let mut inner = self.inner.lock().await;

        for item in &new.items {
            if !inner.products.contains_key(&item.product_id) {
                return Err(AppError::NotFound(format!("producto {}", item.product_id)));
            }
        }
        for item in &new.items {
            if let Some(product) = inner.products.get_mut(&item.product_id) {
                product.stock += item.quantity;
                product.updated_at = Utc::now();
            }
        }

        let purchase_id = Uuid::now_v7();
        let items: Vec<PurchaseItem> = new
            .items
            .iter()
            .map(|item| PurchaseItem {
                id: Uuid::now_v7(),
                purchase_id,
                product_id: item.product_id,
                quantity: item.quantity,
                unit_cost: item.unit_cost,
            })
            .collect();
        let purchase = Purchase {
            id: purchase_id,
            supplier: new.supplier.clone(),
            notes: new.notes.clone(),
            total_cost: new.total_cost(),
            items,
            created_at: Utc::now(),
        };
        inner.purchases.push(purchase.clone());
        Ok(purchase)
    }

    async fn purchases(&self, page: Page) -> Result<(Vec<Purchase>, i64), AppError> {
        let inner = self.inner.lock().await;
        let all: Vec<Purchase> = inner.purchases.iter().rev().cloned().collect();
        let total = all.len() as i64;
        Ok((paginate(&all, page), total))
    }
}
