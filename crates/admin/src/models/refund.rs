//! Refund domain models.
//!
//! A `RefundRequest` is created by the storefront when a customer starts a
//! return, with its `RefundItem`s already attached. The admin panel only
//! advances the status, stamps timestamps, and edits the handful of free-text
//! fields an operator owns.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tidemark_core::{
    Money, OrderId, OrderItemId, ProductId, RefundItemId, RefundReason, RefundRequestId,
    RefundStatus, UserId,
};

/// Rows per page on admin list views.
pub const PAGE_SIZE: i64 = 100;

/// A related record that a list column needed was not there.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplayError {
    #[error("order item #{0} has no product")]
    MissingProduct(OrderItemId),
    #[error("user #{0} has no username")]
    MissingUsername(UserId),
}

/// A customer refund request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    pub id: RefundRequestId,
    /// `None` only if the order row disappeared underneath the refund.
    pub order_id: Option<OrderId>,
    /// `None` for guest checkouts.
    pub user_id: Option<UserId>,
    /// Joined from `users`.
    pub username: Option<String>,
    pub customer_email: String,
    pub customer_name: String,
    pub status: RefundStatus,
    pub reason: RefundReason,
    pub reason_details: String,
    pub refund_amount: Decimal,
    /// Loyalty rewards spent on the original order.
    pub rewards_used: Decimal,
    pub tracking_number: String,
    pub paypal_refund_id: String,
    pub admin_notes: String,
    pub rejection_reason: String,
    /// Set once spent rewards were re-credited as goodwill.
    pub rewards_restored_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub product_received_at: Option<DateTime<Utc>>,
    pub refund_completed_at: Option<DateTime<Utc>>,
}

impl RefundRequest {
    /// Whether the order was placed without an account.
    #[must_use]
    pub const fn is_guest(&self) -> bool {
        self.user_id.is_none()
    }

    /// Whether the original order spent any loyalty rewards.
    #[must_use]
    pub fn used_rewards(&self) -> bool {
        self.rewards_used > Decimal::ZERO
    }

    /// "Order" column: `Order #42`, or `-` when the order is gone.
    #[must_use]
    pub fn order_label(&self) -> String {
        self.order_id
            .map_or_else(|| "-".to_string(), |id| format!("Order #{id}"))
    }

    /// "Customer" column: `alice (alice@example.com)` or `Guest (bob@example.com)`.
    #[must_use]
    pub fn customer_info(&self) -> String {
        match self.username() {
            Ok(Some(username)) => format!("{username} ({})", self.customer_email),
            Ok(None) => format!("Guest ({})", self.customer_email),
            Err(e) => format!("Error: {e}"),
        }
    }

    fn username(&self) -> Result<Option<&str>, DisplayError> {
        match (self.user_id, self.username.as_deref()) {
            (None, _) => Ok(None),
            (Some(_), Some(username)) => Ok(Some(username)),
            (Some(id), None) => Err(DisplayError::MissingUsername(id)),
        }
    }

    /// "Refund Amount" column: `$40.00`, plus `(Rewards: $5.00)` when rewards were used.
    #[must_use]
    pub fn refund_amount_display(&self) -> String {
        let amount = Money::new(self.refund_amount).to_string();
        if self.used_rewards() {
            format!("{amount} (Rewards: {})", Money::new(self.rewards_used))
        } else {
            amount
        }
    }

    #[must_use]
    pub const fn status_label(&self) -> &'static str {
        self.status.label()
    }

    #[must_use]
    pub const fn reason_label(&self) -> &'static str {
        self.reason.label()
    }
}

/// One product line being refunded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundItem {
    pub id: RefundItemId,
    pub refund_request_id: RefundRequestId,
    pub order_item_id: OrderItemId,
    pub quantity_to_refund: i32,
    pub refund_amount: Decimal,
    pub condition_acceptable: bool,
    pub restocked: bool,
    pub condition_notes: String,
    /// Joined through `order_items`; `None` if the product was deleted.
    pub product_id: Option<ProductId>,
    pub product_title: Option<String>,
}

impl RefundItem {
    /// Title of the refunded product.
    ///
    /// # Errors
    ///
    /// Returns `DisplayError::MissingProduct` when the order item no longer
    /// points at a product.
    pub fn product(&self) -> Result<&str, DisplayError> {
        self.product_title
            .as_deref()
            .ok_or(DisplayError::MissingProduct(self.order_item_id))
    }

    /// "Product" column; failures render inline.
    #[must_use]
    pub fn product_name(&self) -> String {
        match self.product() {
            Ok(title) => title.to_string(),
            Err(e) => format!("Error: {e}"),
        }
    }
}

/// A refund request with its line items, for the detail page.
#[derive(Debug, Clone)]
pub struct RefundWithItems {
    pub refund: RefundRequest,
    pub items: Vec<RefundItem>,
}

/// The "created" date filter choices on the refund list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatedWithin {
    Today,
    Past7Days,
    ThisMonth,
    ThisYear,
}

impl CreatedWithin {
    pub const ALL: [Self; 4] = [Self::Today, Self::Past7Days, Self::ThisMonth, Self::ThisYear];

    /// Query-string value.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Past7Days => "past_7_days",
            Self::ThisMonth => "this_month",
            Self::ThisYear => "this_year",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Past7Days => "Past 7 days",
            Self::ThisMonth => "This month",
            Self::ThisYear => "This year",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    /// Inclusive lower bound (midnight UTC) relative to `now`.
    #[must_use]
    pub fn start(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let today = now.date_naive();
        let day = match self {
            Self::Today => Some(today),
            Self::Past7Days => today.checked_sub_signed(Duration::days(7)),
            Self::ThisMonth => today.with_day(1),
            Self::ThisYear => NaiveDate::from_ymd_opt(today.year(), 1, 1),
        }?;
        day.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
    }
}

/// Filter criteria for the refund request list.
#[derive(Debug, Clone)]
pub struct RefundFilter {
    pub status: Option<RefundStatus>,
    pub reason: Option<RefundReason>,
    pub created_since: Option<DateTime<Utc>>,
    /// Date hierarchy drill-down.
    pub year: Option<i32>,
    pub month: Option<i32>,
    /// Matches order id, customer email, customer name or username.
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for RefundFilter {
    fn default() -> Self {
        Self {
            status: None,
            reason: None,
            created_since: None,
            year: None,
            month: None,
            search: None,
            limit: PAGE_SIZE,
            offset: 0,
        }
    }
}

/// Filter criteria for the refund item list.
#[derive(Debug, Clone)]
pub struct RefundItemFilter {
    pub condition_acceptable: Option<bool>,
    pub restocked: Option<bool>,
    /// Matches refund id or product title.
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for RefundItemFilter {
    fn default() -> Self {
        Self {
            condition_acceptable: None,
            restocked: None,
            search: None,
            limit: PAGE_SIZE,
            offset: 0,
        }
    }
}

/// The operator-editable fields of a refund request.
#[derive(Debug, Clone)]
pub struct RefundUpdate {
    pub status: RefundStatus,
    pub reason: RefundReason,
    pub reason_details: String,
    pub tracking_number: String,
    pub paypal_refund_id: String,
    pub admin_notes: String,
    pub rejection_reason: String,
}

/// The editable inline fields of one refund item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundItemUpdate {
    pub id: RefundItemId,
    pub condition_acceptable: bool,
    pub condition_notes: String,
    pub restocked: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn refund() -> RefundRequest {
        let now = Utc::now();
        RefundRequest {
            id: RefundRequestId::new(7),
            order_id: Some(OrderId::new(1001)),
            user_id: Some(UserId::new(3)),
            username: Some("maria".to_string()),
            customer_email: "maria@example.com".to_string(),
            customer_name: "Maria Lopez".to_string(),
            status: RefundStatus::PendingReturn,
            reason: RefundReason::Damaged,
            reason_details: String::new(),
            refund_amount: Decimal::new(4_000, 2),
            rewards_used: Decimal::ZERO,
            tracking_number: String::new(),
            paypal_refund_id: String::new(),
            admin_notes: String::new(),
            rejection_reason: String::new(),
            rewards_restored_at: None,
            created_at: now,
            updated_at: now,
            product_received_at: None,
            refund_completed_at: None,
        }
    }

    #[test]
    fn test_order_label() {
        let mut r = refund();
        assert_eq!(r.order_label(), "Order #1001");
        r.order_id = None;
        assert_eq!(r.order_label(), "-");
    }

    #[test]
    fn test_customer_info_registered_and_guest() {
        let mut r = refund();
        assert_eq!(r.customer_info(), "maria (maria@example.com)");

        r.user_id = None;
        r.username = None;
        assert_eq!(r.customer_info(), "Guest (maria@example.com)");
    }

    #[test]
    fn test_customer_info_renders_dangling_user_inline() {
        let mut r = refund();
        r.username = None;
        assert_eq!(r.customer_info(), "Error: user #3 has no username");
    }

    #[test]
    fn test_refund_amount_display() {
        let mut r = refund();
        assert_eq!(r.refund_amount_display(), "$40.00");
        r.rewards_used = Decimal::new(550, 2);
        assert_eq!(r.refund_amount_display(), "$40.00 (Rewards: $5.50)");
    }

    #[test]
    fn test_product_name_falls_back_to_inline_error() {
        let mut item = RefundItem {
            id: RefundItemId::new(1),
            refund_request_id: RefundRequestId::new(7),
            order_item_id: OrderItemId::new(12),
            quantity_to_refund: 1,
            refund_amount: Decimal::new(2_000, 2),
            condition_acceptable: false,
            restocked: false,
            condition_notes: String::new(),
            product_id: Some(ProductId::new(5)),
            product_title: Some("Linen Apron".to_string()),
        };
        assert_eq!(item.product_name(), "Linen Apron");

        item.product_title = None;
        assert_eq!(item.product_name(), "Error: order item #12 has no product");
    }

    #[test]
    fn test_created_within_bounds() {
        let now = DateTime::parse_from_rfc3339("2026-03-18T15:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let start = |c: CreatedWithin| c.start(now).unwrap().to_rfc3339();

        assert_eq!(start(CreatedWithin::Today), "2026-03-18T00:00:00+00:00");
        assert_eq!(start(CreatedWithin::Past7Days), "2026-03-11T00:00:00+00:00");
        assert_eq!(start(CreatedWithin::ThisMonth), "2026-03-01T00:00:00+00:00");
        assert_eq!(start(CreatedWithin::ThisYear), "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_created_within_keys() {
        for choice in CreatedWithin::ALL {
            assert_eq!(CreatedWithin::from_key(choice.key()), Some(choice));
        }
        assert_eq!(CreatedWithin::from_key("yesterday"), None);
    }
}
