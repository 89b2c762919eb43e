//! Query strings, form bodies and template views for the refund pages.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use tidemark_core::{RefundItemId, RefundReason, RefundRequestId, RefundStatus, TransitionError};

use crate::models::refund::{
    CreatedWithin, PAGE_SIZE, RefundFilter, RefundItem, RefundItemUpdate, RefundRequest,
    RefundUpdate,
};
use super::super::{page_number, search_term};

/// Refund list query parameters.
///
/// Unknown or malformed values are ignored rather than rejected, matching
/// how the filter sidebar links are built.
#[derive(Debug, Default, Deserialize)]
pub struct RefundsQuery {
    pub status: Option<String>,
    pub reason: Option<String>,
    pub created: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
    pub q: Option<String>,
    pub page: Option<String>,
}

impl RefundsQuery {
    #[must_use]
    pub fn status(&self) -> Option<RefundStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }

    #[must_use]
    pub fn reason(&self) -> Option<RefundReason> {
        self.reason.as_deref().and_then(|s| s.parse().ok())
    }

    #[must_use]
    pub fn created(&self) -> Option<CreatedWithin> {
        self.created.as_deref().and_then(CreatedWithin::from_key)
    }

    #[must_use]
    pub fn year(&self) -> Option<i32> {
        self.year
            .as_deref()
            .and_then(|y| y.trim().parse().ok())
            .filter(|y| (1..=9999).contains(y))
    }

    /// Month only counts inside a selected year.
    #[must_use]
    pub fn month(&self) -> Option<i32> {
        self.year()?;
        self.month
            .as_deref()
            .and_then(|m| m.trim().parse().ok())
            .filter(|m| (1..=12).contains(m))
    }

    #[must_use]
    pub fn page(&self) -> i64 {
        page_number(self.page.as_deref())
    }

    #[must_use]
    pub fn to_filter(&self, now: DateTime<Utc>) -> RefundFilter {
        RefundFilter {
            status: self.status(),
            reason: self.reason(),
            created_since: self.created().and_then(|c| c.start(now)),
            year: self.year(),
            month: self.month(),
            search: search_term(self.q.as_deref()),
            limit: PAGE_SIZE,
            offset: (self.page() - 1) * PAGE_SIZE,
        }
    }

    /// The active, valid parameters other than `page`, for links that keep
    /// the current view.
    #[must_use]
    pub fn preserved(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(status) = self.status() {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(reason) = self.reason() {
            params.push(("reason", reason.as_str().to_string()));
        }
        if let Some(created) = self.created() {
            params.push(("created", created.key().to_string()));
        }
        if let Some(year) = self.year() {
            params.push(("year", year.to_string()));
        }
        if let Some(month) = self.month() {
            params.push(("month", month.to_string()));
        }
        if let Some(q) = search_term(self.q.as_deref()) {
            params.push(("q", q));
        }
        params
    }
}

/// Body of `POST /refunds/actions`:
/// `action=<key>&refund_id=1&refund_id=2&next=/refunds?status=...`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ActionForm {
    pub action: Option<String>,
    /// Selected ids in submission order, without duplicates.
    pub ids: Vec<RefundRequestId>,
    pub next: Option<String>,
}

impl ActionForm {
    /// Parse a urlencoded body. Ids that aren't integers are dropped.
    #[must_use]
    pub fn parse(body: &[u8]) -> Self {
        let mut form = Self::default();
        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "action" => {
                    form.action = Some(value.trim().to_string()).filter(|a| !a.is_empty());
                }
                "refund_id" => {
                    if let Ok(id) = value.trim().parse::<i32>() {
                        let id = RefundRequestId::new(id);
                        if !form.ids.contains(&id) {
                            form.ids.push(id);
                        }
                    }
                }
                "next" => form.next = Some(value.into_owned()),
                _ => {}
            }
        }
        form
    }

    /// Where to go afterwards: the submitted list URL if it stays on the
    /// refund list, else the plain list.
    #[must_use]
    pub fn redirect_target(&self) -> String {
        match self.next.as_deref() {
            Some(next) if next == "/refunds" || next.starts_with("/refunds?") => next.to_string(),
            _ => "/refunds".to_string(),
        }
    }
}

/// A refund edit form that failed validation.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("\"{0}\" is not a valid status")]
    InvalidStatus(String),
    #[error("\"{0}\" is not a valid reason")]
    InvalidReason(String),
    #[error("{0}")]
    Transition(#[from] TransitionError),
}

/// Parsed body of `POST /refunds/{id}`.
///
/// Inline item rows are named `item-<id>-<field>` and listed by `item_id`.
/// Only listed items that belong to the refund are updated. Checkboxes are
/// absent when unchecked.
pub struct RefundForm {
    fields: HashMap<String, String>,
    item_ids: Vec<RefundItemId>,
}

impl RefundForm {
    #[must_use]
    pub fn parse(body: &[u8]) -> Self {
        let mut fields = HashMap::new();
        let mut item_ids = Vec::new();
        for (key, value) in url::form_urlencoded::parse(body) {
            if key == "item_id" {
                if let Ok(id) = value.trim().parse::<i32>() {
                    item_ids.push(RefundItemId::new(id));
                }
            } else {
                fields.insert(key.into_owned(), value.into_owned());
            }
        }
        Self { fields, item_ids }
    }

    fn text(&self, name: &str) -> String {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    fn checked(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Validate against the stored refund. The status may only move along
    /// the workflow's edges; everything else is free text.
    ///
    /// A status edit here is saved as is: it does not stamp
    /// `product_received_at`/`refund_completed_at` or run the restock and
    /// rewards helpers. Those belong to the bulk actions.
    ///
    /// # Errors
    ///
    /// Returns `FormError` for a missing or unknown status/reason, or a
    /// status change the workflow doesn't allow.
    pub fn validate(
        &self,
        current: &RefundRequest,
        items: &[RefundItem],
    ) -> Result<(RefundUpdate, Vec<RefundItemUpdate>), FormError> {
        let status_raw = self.fields.get("status").ok_or(FormError::Missing("Status"))?;
        let target: RefundStatus = status_raw
            .parse()
            .map_err(|_| FormError::InvalidStatus(status_raw.clone()))?;
        let status = current.status.transition_to(target)?;

        let reason_raw = self.fields.get("reason").ok_or(FormError::Missing("Reason"))?;
        let reason: RefundReason = reason_raw
            .parse()
            .map_err(|_| FormError::InvalidReason(reason_raw.clone()))?;

        let update = RefundUpdate {
            status,
            reason,
            reason_details: self.text("reason_details"),
            tracking_number: self.text("tracking_number"),
            paypal_refund_id: self.text("paypal_refund_id"),
            admin_notes: self.text("admin_notes"),
            rejection_reason: self.text("rejection_reason"),
        };

        let item_updates = items
            .iter()
            .filter(|item| self.item_ids.contains(&item.id))
            .map(|item| {
                let prefix = format!("item-{}-", item.id);
                RefundItemUpdate {
                    id: item.id,
                    condition_acceptable: self.checked(&format!("{prefix}condition_acceptable")),
                    condition_notes: self.text(&format!("{prefix}condition_notes")),
                    restocked: self.checked(&format!("{prefix}restocked")),
                }
            })
            .collect();

        Ok((update, item_updates))
    }
}

fn timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string())
}

/// One row of the refund list.
#[derive(Debug, Clone)]
pub struct RefundRowView {
    pub id: String,
    pub url: String,
    pub order: String,
    pub customer: String,
    pub refund_amount: String,
    pub status: &'static str,
    pub status_key: &'static str,
    pub reason: &'static str,
    pub created_at: String,
}

impl From<&RefundRequest> for RefundRowView {
    fn from(refund: &RefundRequest) -> Self {
        Self {
            id: refund.id.to_string(),
            url: format!("/refunds/{}", refund.id),
            order: refund.order_label(),
            customer: refund.customer_info(),
            refund_amount: refund.refund_amount_display(),
            status: refund.status_label(),
            status_key: refund.status.as_str(),
            reason: refund.reason_label(),
            created_at: timestamp(Some(refund.created_at)),
        }
    }
}

/// A `<select>` option.
#[derive(Debug, Clone)]
pub struct ChoiceView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Inline refund item row on the detail page.
#[derive(Debug, Clone)]
pub struct InlineItemView {
    pub id: String,
    pub url: String,
    pub order_item: String,
    pub product: String,
    pub quantity: i32,
    pub refund_amount: String,
    pub condition_acceptable: bool,
    pub condition_notes: String,
    pub restocked: bool,
}

impl From<&RefundItem> for InlineItemView {
    fn from(item: &RefundItem) -> Self {
        Self {
            id: item.id.to_string(),
            url: format!("/refund-items/{}", item.id),
            order_item: format!("Order item #{}", item.order_item_id),
            product: item.product_name(),
            quantity: item.quantity_to_refund,
            refund_amount: tidemark_core::Money::new(item.refund_amount).to_string(),
            condition_acceptable: item.condition_acceptable,
            condition_notes: item.condition_notes.clone(),
            restocked: item.restocked,
        }
    }
}

/// Refund detail page, grouped the way the form's fieldsets are.
#[derive(Debug, Clone)]
pub struct RefundDetailView {
    pub id: String,
    pub form_action: String,
    // Order Information
    pub order: String,
    pub order_url: Option<String>,
    pub customer: String,
    pub customer_name: String,
    // Refund Details
    pub status_label: &'static str,
    pub status_choices: Vec<ChoiceView>,
    pub reason_choices: Vec<ChoiceView>,
    pub reason_details: String,
    pub refund_amount: String,
    pub rewards_used: String,
    pub rewards_restored_at: String,
    // Return Tracking
    pub tracking_number: String,
    // PayPal Refund
    pub paypal_refund_id: String,
    // Admin Management
    pub admin_notes: String,
    pub rejection_reason: String,
    // Timestamps
    pub created_at: String,
    pub updated_at: String,
    pub product_received_at: String,
    pub refund_completed_at: String,
    pub items: Vec<InlineItemView>,
}

impl RefundDetailView {
    #[must_use]
    pub fn new(refund: &RefundRequest, items: &[RefundItem]) -> Self {
        // Only statuses the current one may move to (itself included)
        let status_choices = RefundStatus::ALL
            .into_iter()
            .filter(|s| refund.status.transition_to(*s).is_ok())
            .map(|s| ChoiceView {
                value: s.as_str(),
                label: s.label(),
                selected: s == refund.status,
            })
            .collect();
        let reason_choices = RefundReason::ALL
            .into_iter()
            .map(|r| ChoiceView {
                value: r.as_str(),
                label: r.label(),
                selected: r == refund.reason,
            })
            .collect();

        Self {
            id: refund.id.to_string(),
            form_action: format!("/refunds/{}", refund.id),
            order: refund.order_label(),
            order_url: refund.order_id.map(|id| format!("/orders/{id}")),
            customer: refund.customer_info(),
            customer_name: refund.customer_name.clone(),
            status_label: refund.status_label(),
            status_choices,
            reason_choices,
            reason_details: refund.reason_details.clone(),
            refund_amount: refund.refund_amount_display(),
            rewards_used: tidemark_core::Money::new(refund.rewards_used).to_string(),
            rewards_restored_at: timestamp(refund.rewards_restored_at),
            tracking_number: refund.tracking_number.clone(),
            paypal_refund_id: refund.paypal_refund_id.clone(),
            admin_notes: refund.admin_notes.clone(),
            rejection_reason: refund.rejection_reason.clone(),
            created_at: timestamp(Some(refund.created_at)),
            updated_at: timestamp(Some(refund.updated_at)),
            product_received_at: timestamp(refund.product_received_at),
            refund_completed_at: timestamp(refund.refund_completed_at),
            items: items.iter().map(InlineItemView::from).collect(),
        }
    }
}
