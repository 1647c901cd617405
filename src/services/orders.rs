//! Order service: placement (the core), listing and admin mutations

use crate::domain::events::OrderEvent;
use crate::domain::order::{NewOrder, Order, OrderStatus};
use crate::error::AppError;
use crate::notify::{render, Outbox};
use crate::store::{Page, Store};
use std::sync::Arc;
use uuid::Uuid;

pub struct OrderService {
    store: Arc<dyn Store>,
    outbox: Outbox,
    nats: Option<async_nats::Client>,
    admin_email: String,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn Store>,
        outbox: Outbox,
        nats: Option<async_nats::Client>,
        admin_email: impl Into<String>,
    ) -> Self {
        Self { store, outbox, nats, admin_email: admin_email.into() }
    }

    fn check(new: &NewOrder) -> Result<(), AppError> {
        if new.items.is_empty() {
            return Err(AppError::Validation("order must contain at least one item".into()));
        }
        if new.customer_name.trim().is_empty() {
            return Err(AppError::Validation("buyer name is required".into()));
        }
        if new.total < 0 {
            return Err(AppError::Validation("total must not be negative".into()));
        }
        for item in &new.items {
            if item.quantity < 1 {
                return Err(AppError::Validation(format!(
                    "quantity for product {} must be a positive integer",
                    item.product_id
                )));
            }
            if item.unit_price < 0 {
                return Err(AppError::Validation(format!(
                    "price for product {} must not be negative",
                    item.product_id
                )));
            }
        }
        Ok(())
    }

    /// Places an order: validates the draft, reconciles stock atomically and
    /// persists the order, then triggers notifications. Notification and
    /// event publishing failures never affect the placed order.
    pub async fn place(&self, new: NewOrder) -> Result<Order, AppError> {
        Self::check(&new)?;
        let order = self.store.create_order(new).await?;
        tracing::info!(
            order = %order.order_number,
            total = order.total,
            profit = order.profit,
            items = order.items.len(),
            "order placed"
        );

        self.outbox.enqueue(render::admin_summary(&order, &self.admin_email));
        self.outbox.enqueue(render::buyer_confirmation(&order));
        self.publish(OrderEvent::Created {
            order_id: order.id,
            order_number: order.order_number.clone(),
            total: order.total,
            profit: order.profit,
            item_count: order.items.len(),
        })
        .await;

        Ok(order)
    }

    pub async fn list(&self, page: Page) -> Result<(Vec<Order>, i64), AppError> {
        self.store.orders(page).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Order, AppError> {
        self.store
            .order(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("pedido {id}")))
    }

    pub async fn set_status(&self, id: Uuid, status: &str) -> Result<Order, AppError> {
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let order = self
            .store
            .update_order_status(id, status)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("pedido {id}")))?;
        self.publish(OrderEvent::StatusChanged { order_id: order.id, status: status.to_string() })
            .await;
        Ok(order)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.store.delete_order(id).await? {
            return Err(AppError::NotFound(format!("pedido {id}")));
        }
        self.publish(OrderEvent::Deleted { order_id: id }).await;
        Ok(())
    }

    async fn publish(&self, event: OrderEvent) {
        let Some(client) = &self.nats else { return };
        let payload = match serde_json::to_vec(&event) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize order event");
                return;
            }
        };
        if let Err(e) = client.publish(event.subject(), payload.into()).await {
            tracing::warn!(error = %e, subject = event.subject(), "failed to publish order event");
        }
    }
}
