//! HTML rendering for the order confirmation and admin summary

use super::Email;
use crate::domain::order::Order;

pub fn money(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}

fn items_table(order: &Order) -> String {
    let mut rows = String::new();
    for item in &order.items {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            item.product_id,
            item.quantity,
            money(item.unit_price),
            money(item.unit_price * i64::from(item.quantity)),
        ));
    }
    format!(
        "<table><thead><tr><th>Producto</th><th>Cantidad</th><th>Precio</th><th>Subtotal</th></tr></thead>\
         <tbody>{rows}</tbody></table>"
    )
}

/// Confirmation sent to the buyer's address.
pub fn buyer_confirmation(order: &Order) -> Email {
    let html = format!(
        "<h1>¡Gracias por tu pedido, {}!</h1>\
         <p>Recibimos tu pedido <strong>{}</strong> y lo estamos preparando.</p>\
         {}\
         <p>Total: <strong>{}</strong></p>\
         <p>Método de pago: {}</p>",
        order.customer_name,
        order.order_number,
        items_table(order),
        money(order.total),
        order.payment_method,
    );
    Email {
        to: order.customer_email.clone(),
        subject: format!("Confirmación de pedido {}", order.order_number),
        html,
    }
}

/// Summary sent to the back-office address; includes the computed profit.
pub fn admin_summary(order: &Order, admin_email: &str) -> Email {
    let html = format!(
        "<h1>Nuevo pedido {}</h1>\
         <p>Cliente: {} &lt;{}&gt;{}</p>\
         {}\
         <p>Total: <strong>{}</strong> - Ganancia: <strong>{}</strong></p>\
         {}",
        order.order_number,
        order.customer_name,
        order.customer_email,
        order
            .customer_phone
            .as_deref()
            .map(|t| format!(" - Tel: {t}"))
            .unwrap_or_default(),
        items_table(order),
        money(order.total),
        money(order.profit),
        order
            .notes
            .as_deref()
            .map(|n| format!("<p>Observaciones: {n}</p>"))
            .unwrap_or_default(),
    );
    Email {
        to: admin_email.to_string(),
        subject: format!("Nuevo pedido {} - {}", order.order_number, money(order.total)),
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderItem, OrderStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_order() -> Order {
        let order_id = Uuid::new_v4();
        Order {
            id: order_id,
            order_number: "ORD-00001234".into(),
            user_id: None,
            status: OrderStatus::Pending,
            total: 75_000,
            profit: 25_000,
            payment_method: "transferencia".into(),
            shipping_address: None,
            shipping_method: None,
            customer_name: "Ana".into(),
            customer_email: "ana@example.com".into(),
            customer_phone: Some("11-5555".into()),
            notes: Some("entregar por la tarde".into()),
            items: vec![OrderItem {
                id: Uuid::new_v4(),
                order_id,
                product_id: Uuid::new_v4(),
                quantity: 5,
                unit_price: 15_000,
                position: 0,
            }],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn money_formatting() {
        assert_eq!(money(75_000), "$750.00");
        assert_eq!(money(105), "$1.05");
        assert_eq!(money(-250), "-$2.50");
    }

    #[test]
    fn buyer_email_addresses_the_buyer() {
        let email = buyer_confirmation(&sample_order());
        assert_eq!(email.to, "ana@example.com");
        assert!(email.subject.contains("ORD-00001234"));
        assert!(email.html.contains("$750.00"));
        // the buyer never sees the profit
        assert!(!email.html.contains("Ganancia"));
    }

    #[test]
    fn admin_email_carries_profit_and_notes() {
        let email = admin_summary(&sample_order(), "ventas@example.com");
        assert_eq!(email.to, "ventas@example.com");
        assert!(email.html.contains("Ganancia"));
        assert!(email.html.contains("$250.00"));
        assert!(email.html.contains("entregar por la tarde"));
    }
}
