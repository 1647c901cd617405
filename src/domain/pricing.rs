//! Price-list derivation: margin percentage over a base price
//!
//! Derived prices are computed on the fly for a requested customer tier and
//! never persisted.

use crate::domain::product::Product;

/// `base * (1 + margin/100)` on integer minor units, rounded half-up.
pub fn display_price(base: i64, margin_pct: u32) -> i64 {
    let scaled = i128::from(base) * (100 + i128::from(margin_pct));
    let rounded = (scaled + 50) / 100;
    rounded as i64
}

/// Price shown on a tier list: a manual override supersedes the derived
/// value. The margin applies to the cost price, falling back to the sale
/// price for products without one.
pub fn list_price(product: &Product, margin_pct: u32) -> i64 {
    if let Some(override_price) = product.override_price {
        return override_price;
    }
    display_price(product.cost_price.unwrap_or(product.price), margin_pct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn product(price: i64, cost_price: Option<i64>, override_price: Option<i64>) -> Product {
        Product {
            id: Uuid::new_v4(),
            sku: None,
            name: "p".into(),
            description: None,
            price,
            cost_price,
            override_price,
            stock: 0,
            category: None,
            image_urls: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn margin_is_applied_to_base() {
        assert_eq!(display_price(10_000, 35), 13_500);
        assert_eq!(display_price(10_000, 0), 10_000);
    }

    #[test]
    fn rounds_half_up() {
        // 999 * 1.10 = 1098.9
        assert_eq!(display_price(999, 10), 1_099);
        // 1001 * 1.10 = 1101.1
        assert_eq!(display_price(1_001, 10), 1_101);
    }

    #[test]
    fn override_supersedes_derived_price() {
        let p = product(2_000, Some(1_000), Some(1_499));
        assert_eq!(list_price(&p, 50), 1_499);
    }

    #[test]
    fn falls_back_to_sale_price_without_cost() {
        let p = product(2_000, None, None);
        assert_eq!(list_price(&p, 10), 2_200);
        let p = product(2_000, Some(1_000), None);
        assert_eq!(list_price(&p, 10), 1_100);
    }
}
