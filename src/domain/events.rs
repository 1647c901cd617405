//! Order lifecycle events published to NATS when a client is configured

use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Created { order_id: Uuid, order_number: String, total: i64, profit: i64, item_count: usize },
    StatusChanged { order_id: Uuid, status: String },
    Deleted { order_id: Uuid },
}

impl OrderEvent {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Created { .. } => "orders.created",
            Self::StatusChanged { .. } => "orders.status_changed",
            Self::Deleted { .. } => "orders.deleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_event_shape() {
        let event = OrderEvent::Created {
            order_id: Uuid::new_v4(),
            order_number: "ORD-00000001".into(),
            total: 750,
            profit: 250,
            item_count: 1,
        };
        assert_eq!(event.subject(), "orders.created");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "created");
        assert_eq!(value["profit"], 250);
    }
}
