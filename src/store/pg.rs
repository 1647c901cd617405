//! Postgres backend
//!
//! Runtime query strings throughout; order placement runs inside one
//! transaction with row locks on the validation reads, so concurrent
//! submissions can never drive stock negative.

use super::{Page, Store};
use crate::domain::order::{self, NewOrder, Order, OrderItem, OrderStatus};
use crate::domain::product::{NewProduct, Product, ProductPatch};
use crate::domain::profile::{Profile, Role};
use crate::domain::purchase::{NewPurchase, Purchase, PurchaseItem};
use crate::error::{AppError, StockFault};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn order_items(&self, order_ids: &[Uuid]) -> Result<Vec<OrderItem>, AppError> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY position",
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    user_id: Option<Uuid>,
    status: String,
    total: i64,
    profit: i64,
    payment_method: String,
    shipping_address: Option<String>,
    shipping_method: Option<String>,
    customer_name: String,
    customer_email: String,
    customer_phone: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, AppError> {
        let status = self
            .status
            .parse::<OrderStatus>()
            .map_err(|e| AppError::Internal(format!("order {}: {}", self.id, e)))?;
        Ok(Order {
            id: self.id,
            order_number: self.order_number,
            user_id: self.user_id,
            status,
            total: self.total,
            profit: self.profit,
            payment_method: self.payment_method,
            shipping_address: self.shipping_address,
            shipping_method: self.shipping_method,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            notes: self.notes,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    email: String,
    display_name: String,
    role: String,
    tax_id: Option<String>,
    tax_regime: Option<String>,
    business_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl ProfileRow {
    fn into_profile(self) -> Result<Profile, AppError> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|e| AppError::Internal(format!("profile {}: {}", self.id, e)))?;
        Ok(Profile {
            id: self.id,
            email: self.email,
            display_name: self.display_name,
            role,
            tax_id: self.tax_id,
            tax_regime: self.tax_regime,
            business_name: self.business_name,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PurchaseRow {
    id: Uuid,
    supplier: Option<String>,
    notes: Option<String>,
    total_cost: i64,
    created_at: DateTime<Utc>,
}

impl PurchaseRow {
    fn into_purchase(self, items: Vec<PurchaseItem>) -> Purchase {
        Purchase {
            id: self.id,
            supplier: self.supplier,
            notes: self.notes,
            total_cost: self.total_cost,
            items,
            created_at: self.created_at,
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_product(&self, new: NewProduct) -> Result<Product, AppError> {
        let product = sqlx::query_as::<_, Product>(
            "INSERT INTO products (id, sku, name, description, price, cost_price, override_price, stock, category, image_urls, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW(), NOW()) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(new.sku.map(|s| s.into_string()))
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price)
        .bind(new.cost_price)
        .bind(new.override_price)
        .bind(new.stock)
        .bind(&new.category)
        .bind(&new.image_urls)
        .fetch_one(&self.pool)
        .await?;
        Ok(product)
    }

    async fn product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn product_by_sku(&self, sku: &str) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE sku = $1")
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn products(&self, page: Page) -> Result<(Vec<Product>, i64), AppError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok((products, total.0))
    }

    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(
            "UPDATE products SET \
               sku = COALESCE($2, sku), \
               name = COALESCE($3, name), \
               description = COALESCE($4, description), \
               price = COALESCE($5, price), \
               cost_price = COALESCE($6, cost_price), \
               override_price = COALESCE($7, override_price), \
               stock = COALESCE($8, stock), \
               category = COALESCE($9, category), \
               image_urls = image_urls || $10, \
               updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(patch.sku.map(|s| s.into_string()))
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.price)
        .bind(patch.cost_price)
        .bind(patch.override_price)
        .bind(patch.stock)
        .bind(patch.category)
        .bind(&patch.add_image_urls)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn delete_product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>("DELETE FROM products WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn create_order(&self, new: NewOrder) -> Result<Order, AppError> {
        let mut tx = self.pool.begin().await?;

        // Validation pass: lock and check every line, collecting all faults
        // before touching any stock.
        let mut faults = Vec::new();
        let mut costs: Vec<Option<i64>> = Vec::with_capacity(new.items.len());
        for item in &new.items {
            let row: Option<(Option<i64>, i32)> = sqlx::query_as(
                "SELECT cost_price, stock FROM products WHERE id = $1 FOR UPDATE",
            )
            .bind(item.product_id)
            .fetch_optional(&mut *tx)
            .await?;
            match row {
                None => {
                    faults.push(StockFault::not_found(item.product_id));
                    costs.push(None);
                }
                Some((cost, stock)) => {
                    if stock < item.quantity {
                        faults.push(StockFault::insufficient(item.product_id, stock));
                    }
                    costs.push(cost);
                }
            }
        }
        if !faults.is_empty() {
            // dropping the transaction rolls the row locks back
            return Err(AppError::Stock(faults));
        }

        // Commit pass: conditional decrement per line, profit accumulation.
        let mut profit = 0i64;
        for (item, cost) in new.items.iter().zip(&costs) {
            let result = sqlx::query(
                "UPDATE products SET stock = stock - $2, updated_at = NOW() \
                 WHERE id = $1 AND stock >= $2",
            )
            .bind(item.product_id)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() == 0 {
                // Only reachable when the same product appears on several
                // lines and their sum exceeds stock: each line validated
                // against the full count, the decrements ran it dry.
                let (stock,): (i32,) = sqlx::query_as("SELECT stock FROM products WHERE id = $1")
                    .bind(item.product_id)
                    .fetch_one(&mut *tx)
                    .await?;
                return Err(AppError::Stock(vec![StockFault::insufficient(item.product_id, stock)]));
            }
            profit += order::line_profit(item.unit_price, *cost, item.quantity);
        }

        let row = sqlx::query_as::<_, OrderRow>(
            "INSERT INTO orders (id, order_number, user_id, status, total, profit, payment_method, \
               shipping_address, shipping_method, customer_name, customer_email, customer_phone, notes, \
               created_at, updated_at) \
             VALUES ($1, $2, $3, 'pending', $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW(), NOW()) \
             RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(order::order_number())
        .bind(new.user_id)
        .bind(new.total)
        .bind(profit)
        .bind(&new.payment_method)
        .bind(&new.shipping_address)
        .bind(&new.shipping_method)
        .bind(&new.customer_name)
        .bind(&new.customer_email)
        .bind(&new.customer_phone)
        .bind(&new.notes)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(new.items.len());
        for (position, item) in new.items.iter().enumerate() {
            let inserted = sqlx::query_as::<_, OrderItem>(
                "INSERT INTO order_items (id, order_id, product_id, quantity, unit_price, position) \
                 VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
            )
            .bind(Uuid::now_v7())
            .bind(row.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(position as i32)
            .fetch_one(&mut *tx)
            .await?;
            items.push(inserted);
        }

        tx.commit().await?;
        row.into_order(items)
    }

    async fn orders(&self, page: Page) -> Result<(Vec<Order>, i64), AppError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT * FROM orders ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut items = self.order_items(&ids).await?;
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let (own, rest): (Vec<_>, Vec<_>) = items.into_iter().partition(|i| i.order_id == row.id);
            items = rest;
            orders.push(row.into_order(own)?);
        }
        Ok((orders, total.0))
    }

    async fn order(&self, id: Uuid) -> Result<Option<Order>, AppError> {
        let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            None => Ok(None),
            Some(row) => {
                let items = self.order_items(&[row.id]).await?;
                Ok(Some(row.into_order(items)?))
            }
        }
    }

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> Result<Option<Order>, AppError> {
        let row = sqlx::query_as::<_, OrderRow>(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;
        match row {
            None => Ok(None),
            Some(row) => {
                let items = self.order_items(&[row.id]).await?;
                Ok(Some(row.into_order(items)?))
            }
        }
    }

    async fn delete_order(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn profile(&self, id: Uuid) -> Result<Option<Profile>, AppError> {
        let row = sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ProfileRow::into_profile).transpose()
    }

    async fn record_purchase(&self, new: NewPurchase) -> Result<Purchase, AppError> {
        let mut tx = self.pool.begin().await?;

        for item in &new.items {
            let result = sqlx::query(
                "UPDATE products SET stock = stock + $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(item.product_id)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() == 0 {
                return Err(AppError::NotFound(format!("producto {}", item.product_id)));
            }
        }

        let row = sqlx::query_as::<_, PurchaseRow>(
            "INSERT INTO purchases (id, supplier, notes, total_cost, created_at) \
             VALUES ($1, $2, $3, $4, NOW()) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&new.supplier)
        .bind(&new.notes)
        .bind(new.total_cost())
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(new.items.len());
        for item in &new.items {
            let inserted = sqlx::query_as::<_, PurchaseItem>(
                "INSERT INTO purchase_items (id, purchase_id, product_id, quantity, unit_cost) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING *",
            )
            .bind(Uuid::now_v7())
            .bind(row.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_cost)
            .fetch_one(&mut *tx)
            .await?;
            items.push(inserted);
        }

        tx.commit().await?;
        Ok(row.into_purchase(items))
    }

    async fn purchases(&self, page: Page) -> Result<(Vec<Purchase>, i64), AppError> {
        let rows = sqlx::query_as::<_, PurchaseRow>(
            "SELECT * FROM purchases ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM purchases")
            .fetch_one(&self.pool)
            .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut items = sqlx::query_as::<_, PurchaseItem>(
            "SELECT * FROM purchase_items WHERE purchase_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        let mut purchases = Vec::with_capacity(rows.len());
        for row in rows {
            let (own, rest): (Vec<_>, Vec<_>) = items.into_iter().partition(|i| i.purchase_id == row.id);
            items = rest;
            purchases.push(row.into_purchase(own));
        }
        Ok((purchases, total.0))
    }
}
