//! Order-side records the refund screens link to.
//!
//! These are read-only in the admin panel; the storefront owns checkout.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use tidemark_core::{Money, OrderId, OrderItemId, ProductId, ShippingAddressId, UserId};

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub customer_email: String,
    pub customer_name: String,
    pub total: Decimal,
    pub rewards_used: Decimal,
    pub rewards_earned: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub fn total_display(&self) -> String {
        Money::new(self.total).to_string()
    }

    #[must_use]
    pub fn customer_label(&self) -> String {
        match &self.username {
            Some(username) => format!("{username} ({})", self.customer_email),
            None => format!("Guest ({})", self.customer_email),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub product_title: Option<String>,
    pub quantity: i32,
    pub price: Decimal,
}

impl OrderItem {
    #[must_use]
    pub fn product_name(&self) -> String {
        self.product_title
            .clone()
            .unwrap_or_else(|| format!("Error: order item #{} has no product", self.id))
    }

    #[must_use]
    pub fn price_display(&self) -> String {
        Money::new(self.price).to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ShippingAddress {
    pub id: ShippingAddressId,
    pub order_id: OrderId,
    pub full_name: String,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub country: String,
}

impl ShippingAddress {
    /// Single-line rendering for list views.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.address1.as_str()];
        if let Some(line) = self.address2.as_deref().filter(|s| !s.is_empty()) {
            parts.push(line);
        }
        parts.push(self.city.as_str());
        if let Some(state) = self.state.as_deref().filter(|s| !s.is_empty()) {
            parts.push(state);
        }
        if let Some(zip) = self.zipcode.as_deref().filter(|s| !s.is_empty()) {
            parts.push(zip);
        }
        parts.push(self.country.as_str());
        parts.join(", ")
    }
}

/// An order with everything its detail page shows.
#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub addresses: Vec<ShippingAddress>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_one_line_skips_blank_parts() {
        let address = ShippingAddress {
            id: ShippingAddressId::new(1),
            order_id: OrderId::new(9),
            full_name: "Ana Silva".to_string(),
            address1: "12 Harbor Rd".to_string(),
            address2: Some(String::new()),
            city: "Portland".to_string(),
            state: Some("ME".to_string()),
            zipcode: None,
            country: "US".to_string(),
        };
        assert_eq!(address.one_line(), "12 Harbor Rd, Portland, ME, US");
    }
}
