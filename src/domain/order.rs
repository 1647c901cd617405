//! Orders, line items and profit accounting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

/// Immutable once the order is created.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Option<Uuid>,
    pub status: OrderStatus,
    pub total: i64,
    pub profit: i64,
    pub payment_method: String,
    pub shipping_address: Option<String>,
    pub shipping_method: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated order draft handed to the data-access layer.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<Uuid>,
    pub payment_method: String,
    pub shipping_address: Option<String>,
    pub shipping_method: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
    pub total: i64,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
    /// Sale price agreed at order time. Recorded profit is computed from this
    /// submitted value, not from a re-read of the catalog price.
    pub unit_price: i64,
}

/// Profit contributed by one line: (sale price - cost price) x quantity.
/// A product without a cost price contributes its full sale price.
pub fn line_profit(unit_price: i64, cost_price: Option<i64>, quantity: i32) -> i64 {
    (unit_price - cost_price.unwrap_or(0)) * i64::from(quantity)
}

pub fn order_number() -> String {
    format!("ORD-{:08}", rand::random::<u32>() % 100_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_profit_uses_cost() {
        assert_eq!(line_profit(150, Some(100), 5), 250);
    }

    #[test]
    fn line_profit_without_cost_is_full_price() {
        assert_eq!(line_profit(200, None, 2), 400);
    }

    #[test]
    fn line_profit_can_go_negative() {
        assert_eq!(line_profit(80, Some(100), 3), -60);
    }

    #[test]
    fn status_round_trips() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("paid".parse::<OrderStatus>().is_err());
    }
}
