//! Refund workflow: the six bulk actions an operator can run on a selection
//! of refund requests.
//!
//! Every action walks the selection in order and handles each refund on its
//! own. A refund in the wrong state is skipped without a message; a failing
//! helper or write is recorded against that refund and the batch carries on.
//! Nothing here aborts the whole batch except failing to load it.
//!
//! Storage and the three side-effect helpers sit behind [`RefundStore`] and
//! [`RefundHooks`] so the workflow can run against Postgres in production and
//! against in-memory fakes in tests.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;

use tidemark_core::{Money, RefundRequestId, RefundStatus, TransitionError};

use crate::db::RepositoryError;
use crate::models::refund::RefundRequest;
use crate::models::session::{FlashMessage, MessageLevel};

/// Persistence the workflow needs.
#[async_trait]
pub trait RefundStore: Send + Sync {
    /// Load the selected refunds, in id order. Unknown ids are dropped.
    async fn load_selected(
        &self,
        ids: &[RefundRequestId],
    ) -> Result<Vec<RefundRequest>, RepositoryError>;

    /// Persist `status`, `product_received_at` and `refund_completed_at`.
    async fn save_transition(&self, refund: &RefundRequest) -> Result<(), RepositoryError>;

    /// Set `condition_acceptable` on every item of the refund. Returns the
    /// number of items touched.
    async fn accept_all_items(&self, id: RefundRequestId) -> Result<u64, RepositoryError>;
}

/// Side effects that live outside the refund row.
#[async_trait]
pub trait RefundHooks: Send + Sync {
    /// Return acceptable, not-yet-restocked items to inventory. Must be
    /// idempotent. Returns the number of items restocked.
    async fn restock_refunded_items(&self, refund: &RefundRequest) -> Result<u64, RepositoryError>;

    /// Deduct the loyalty rewards the customer earned on the refunded items.
    /// Never restores rewards the customer spent. Returns the amount deducted.
    async fn process_rewards_refund(
        &self,
        refund: &RefundRequest,
    ) -> Result<Decimal, RepositoryError>;

    /// Re-credit the rewards spent on the original order. Returns `true` if a
    /// restoration happened now, `false` if it had already been done.
    async fn restore_used_rewards(&self, refund: &RefundRequest) -> Result<bool, RepositoryError>;
}

/// The bulk actions on the refund list, in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefundAction {
    MarkProductReceived,
    ManualRestockItems,
    ProcessPaypalRefund,
    CompleteRefund,
    RestoreRewardsGoodwill,
    RejectRefund,
}

impl RefundAction {
    pub const ALL: [Self; 6] = [
        Self::MarkProductReceived,
        Self::ManualRestockItems,
        Self::ProcessPaypalRefund,
        Self::CompleteRefund,
        Self::RestoreRewardsGoodwill,
        Self::RejectRefund,
    ];

    /// Form value.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::MarkProductReceived => "mark_product_received",
            Self::ManualRestockItems => "manual_restock_items",
            Self::ProcessPaypalRefund => "process_paypal_refund",
            Self::CompleteRefund => "complete_refund",
            Self::RestoreRewardsGoodwill => "restore_rewards_goodwill",
            Self::RejectRefund => "reject_refund",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MarkProductReceived => "Mark product received & restock",
            Self::ManualRestockItems => "Manually restock acceptable items",
            Self::ProcessPaypalRefund => "Mark as processing PayPal refund",
            Self::CompleteRefund => "Complete refund & adjust rewards",
            Self::RestoreRewardsGoodwill => "Restore used rewards as goodwill (admin approval)",
            Self::RejectRefund => "Reject refund request",
        }
    }

    /// Phosphor icon name for the bulk action menu.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::MarkProductReceived => "package",
            Self::ManualRestockItems => "arrows-clockwise",
            Self::ProcessPaypalRefund => "arrow-right",
            Self::CompleteRefund => "check-circle",
            Self::RestoreRewardsGoodwill => "gift",
            Self::RejectRefund => "x-circle",
        }
    }

    /// Shown in red and confirmed before submitting.
    #[must_use]
    pub const fn is_destructive(self) -> bool {
        matches!(self, Self::RejectRefund)
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.key() == key)
    }
}

impl std::fmt::Display for RefundAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A helper or write failed for one refund.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("restocking failed: {0}")]
    Restock(#[source] RepositoryError),
    #[error("rewards adjustment failed: {0}")]
    Rewards(#[source] RepositoryError),
    #[error("goodwill restoration failed: {0}")]
    Goodwill(#[source] RepositoryError),
    #[error("saving refund failed: {0}")]
    Storage(#[source] RepositoryError),
}

impl ActionError {
    /// Operator-facing text for this failure on refund `id`.
    #[must_use]
    pub fn operator_message(&self, id: RefundRequestId) -> String {
        match self {
            Self::Restock(e) => format!("Error restocking items for refund #{id}: {e}"),
            Self::Rewards(e) => format!("Error processing rewards for refund #{id}: {e}"),
            Self::Goodwill(e) => format!("Error restoring rewards for refund #{id}: {e}"),
            Self::Storage(e) => format!("Error updating refund #{id}: {e}"),
        }
    }
}

/// Why a refund was left out of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("refund in status {0} has no items back in the warehouse")]
    NotRestockable(RefundStatus),
}

/// Result of the goodwill action for one refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoodwillOutcome {
    Restored { amount: Decimal },
    AlreadyRestored,
    NoRewardsUsed,
    GuestOrder,
}

/// What happened to one selected refund.
#[derive(Debug)]
pub enum ItemOutcome {
    /// Status advanced.
    Updated,
    /// Status advanced, but the follow-up helper failed.
    UpdatedWithError(ActionError),
    /// Manual restock helper ran.
    Restocked,
    /// Wrong source state; left untouched.
    Skipped(SkipReason),
    /// Left unchanged because a helper or write failed.
    Failed(ActionError),
    Goodwill(GoodwillOutcome),
}

#[derive(Debug)]
pub struct ItemReport {
    pub refund_id: RefundRequestId,
    pub outcome: ItemOutcome,
}

impl ItemReport {
    /// The error attached to this refund, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ActionError> {
        match &self.outcome {
            ItemOutcome::UpdatedWithError(e) | ItemOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.error().map(|e| e.operator_message(self.refund_id))
    }
}

/// Per-refund results of one bulk action.
#[derive(Debug)]
pub struct BatchReport {
    pub action: RefundAction,
    pub items: Vec<ItemReport>,
}

impl BatchReport {
    fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items.iter().filter(|i| pred(&i.outcome)).count()
    }

    /// Refunds whose status changed.
    #[must_use]
    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Updated | ItemOutcome::UpdatedWithError(_)))
    }

    #[must_use]
    pub fn restocked(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Restocked))
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Skipped(_)))
    }

    /// Refunds with an error attached, whether or not their status moved.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.items.iter().filter(|i| i.error().is_some()).count()
    }

    /// Outcome for one refund, if it was part of the batch.
    #[must_use]
    pub fn outcome(&self, id: RefundRequestId) -> Option<&ItemOutcome> {
        self.items
            .iter()
            .find(|i| i.refund_id == id)
            .map(|i| &i.outcome)
    }

    /// Operator messages: one error per failed refund, then the summary.
    #[must_use]
    pub fn messages(&self) -> Vec<FlashMessage> {
        let mut messages: Vec<FlashMessage> = self
            .items
            .iter()
            .filter_map(ItemReport::error_message)
            .map(FlashMessage::error)
            .collect();
        messages.push(self.summary());
        messages
    }

    fn summary(&self) -> FlashMessage {
        match self.action {
            RefundAction::MarkProductReceived => FlashMessage::success(format!(
                "{} refund(s) marked as product received and items restocked.",
                self.updated()
            )),
            RefundAction::ManualRestockItems => match self.restocked() {
                0 => FlashMessage::warning(
                    "No items were restocked. Items may already be restocked or not marked as acceptable condition.",
                ),
                n => FlashMessage::success(format!("Manually restocked items for {n} refund(s).")),
            },
            RefundAction::ProcessPaypalRefund => FlashMessage::warning(format!(
                "{} refund(s) marked as processing. Please process refunds in PayPal dashboard and enter transaction IDs.",
                self.updated()
            )),
            RefundAction::CompleteRefund => FlashMessage::success(format!(
                "{} refund(s) completed successfully. Earned rewards have been deducted. \
                 Used rewards were NOT restored (use \"Restore rewards as goodwill\" if approved).",
                self.updated()
            )),
            RefundAction::RejectRefund => FlashMessage::warning(format!(
                "{} refund(s) rejected. Please add rejection reason in admin notes.",
                self.updated()
            )),
            RefundAction::RestoreRewardsGoodwill => self.goodwill_summary(),
        }
    }

    fn goodwill_summary(&self) -> FlashMessage {
        let mut restored = 0_usize;
        let mut total = Money::ZERO;
        let mut already = 0_usize;
        let mut no_rewards = 0_usize;
        let mut guests = 0_usize;

        for item in &self.items {
            match item.outcome {
                ItemOutcome::Goodwill(GoodwillOutcome::Restored { amount }) => {
                    restored += 1;
                    total = total + Money::new(amount);
                }
                ItemOutcome::Goodwill(GoodwillOutcome::AlreadyRestored) => already += 1,
                ItemOutcome::Goodwill(GoodwillOutcome::NoRewardsUsed) => no_rewards += 1,
                ItemOutcome::Goodwill(GoodwillOutcome::GuestOrder) => guests += 1,
                _ => {}
            }
        }

        let mut parts = Vec::new();
        if restored > 0 {
            parts.push(format!("{restored} customer(s) had {total} in rewards restored"));
        }
        if already > 0 {
            parts.push(format!("{already} already had rewards restored"));
        }
        if no_rewards > 0 {
            parts.push(format!("{no_rewards} had no rewards used in original purchase"));
        }
        if guests > 0 {
            parts.push(format!("{guests} were guest orders (no rewards to restore)"));
        }

        let (level, prefix) = if restored > 0 {
            (MessageLevel::Success, "Rewards restored as goodwill gesture: ")
        } else {
            (MessageLevel::Warning, "No rewards restored: ")
        };
        FlashMessage::new(level, format!("{prefix}{}", parts.join(", ")))
    }
}

/// Runs bulk actions against a store and a set of helpers.
pub struct RefundWorkflow<S, H> {
    store: S,
    hooks: H,
}

impl<S: RefundStore, H: RefundHooks> RefundWorkflow<S, H> {
    #[must_use]
    pub const fn new(store: S, hooks: H) -> Self {
        Self { store, hooks }
    }

    /// Run `action` over the selected refunds, one at a time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` only if the selection cannot be loaded.
    /// Per-refund failures are reported in the returned [`BatchReport`].
    pub async fn run(
        &self,
        action: RefundAction,
        ids: &[RefundRequestId],
    ) -> Result<BatchReport, RepositoryError> {
        let refunds = self.store.load_selected(ids).await?;
        let mut items = Vec::with_capacity(refunds.len());

        for refund in refunds {
            let outcome = match action {
                RefundAction::MarkProductReceived => self.mark_product_received(refund).await,
                RefundAction::ManualRestockItems => self.manual_restock(&refund).await,
                RefundAction::ProcessPaypalRefund => self.process_paypal_refund(refund).await,
                RefundAction::CompleteRefund => self.complete_refund(refund).await,
                RefundAction::RestoreRewardsGoodwill => self.restore_goodwill(&refund).await,
                RefundAction::RejectRefund => self.reject(refund).await,
            };
            items.push(outcome);
        }

        let report = BatchReport { action, items };
        tracing::info!(
            action = %action,
            selected = ids.len(),
            updated = report.updated(),
            restocked = report.restocked(),
            failed = report.failed(),
            skipped = report.skipped(),
            "Refund bulk action completed"
        );
        Ok(report)
    }

    async fn mark_product_received(&self, mut refund: RefundRequest) -> ItemReport {
        let refund_id = refund.id;
        refund.status = match refund.status.mark_received() {
            Ok(next) => next,
            Err(e) => return skipped(refund_id, e.into()),
        };
        refund.product_received_at = Some(Utc::now());

        if let Err(e) = self.store.save_transition(&refund).await {
            return failed(refund_id, ActionError::Storage(e));
        }

        let outcome = match self.accept_and_restock(&refund).await {
            Ok(_) => ItemOutcome::Updated,
            Err(e) => {
                tracing::warn!(refund_id = %refund_id, error = %e, "Restock after receipt failed");
                ItemOutcome::UpdatedWithError(ActionError::Restock(e))
            }
        };
        ItemReport { refund_id, outcome }
    }

    async fn accept_and_restock(&self, refund: &RefundRequest) -> Result<u64, RepositoryError> {
        self.store.accept_all_items(refund.id).await?;
        self.hooks.restock_refunded_items(refund).await
    }

    async fn manual_restock(&self, refund: &RefundRequest) -> ItemReport {
        if !refund.status.is_restockable() {
            return skipped(refund.id, SkipReason::NotRestockable(refund.status));
        }

        match self.hooks.restock_refunded_items(refund).await {
            Ok(count) => {
                tracing::debug!(refund_id = %refund.id, count, "Manual restock");
                ItemReport {
                    refund_id: refund.id,
                    outcome: ItemOutcome::Restocked,
                }
            }
            Err(e) => failed(refund.id, ActionError::Restock(e)),
        }
    }

    async fn process_paypal_refund(&self, mut refund: RefundRequest) -> ItemReport {
        refund.status = match refund.status.begin_refund() {
            Ok(next) => next,
            Err(e) => return skipped(refund.id, e.into()),
        };
        self.save(&refund).await
    }

    async fn complete_refund(&self, mut refund: RefundRequest) -> ItemReport {
        let next = match refund.status.complete() {
            Ok(next) => next,
            Err(e) => return skipped(refund.id, e.into()),
        };

        // Guests have no rewards account to adjust
        if !refund.is_guest()
            && let Err(e) = self.hooks.process_rewards_refund(&refund).await
        {
            return failed(refund.id, ActionError::Rewards(e));
        }

        refund.status = next;
        refund.refund_completed_at = Some(Utc::now());
        self.save(&refund).await
    }

    async fn reject(&self, mut refund: RefundRequest) -> ItemReport {
        refund.status = match refund.status.reject() {
            Ok(next) => next,
            Err(e) => return skipped(refund.id, e.into()),
        };
        self.save(&refund).await
    }

    async fn restore_goodwill(&self, refund: &RefundRequest) -> ItemReport {
        let outcome = if refund.is_guest() {
            GoodwillOutcome::GuestOrder
        } else if !refund.used_rewards() {
            GoodwillOutcome::NoRewardsUsed
        } else {
            match self.hooks.restore_used_rewards(refund).await {
                Ok(true) => GoodwillOutcome::Restored {
                    amount: refund.rewards_used,
                },
                Ok(false) => GoodwillOutcome::AlreadyRestored,
                Err(e) => return failed(refund.id, ActionError::Goodwill(e)),
            }
        };

        ItemReport {
            refund_id: refund.id,
            outcome: ItemOutcome::Goodwill(outcome),
        }
    }

    async fn save(&self, refund: &RefundRequest) -> ItemReport {
        match self.store.save_transition(refund).await {
            Ok(()) => ItemReport {
                refund_id: refund.id,
                outcome: ItemOutcome::Updated,
            },
            Err(e) => failed(refund.id, ActionError::Storage(e)),
        }
    }
}

fn skipped(refund_id: RefundRequestId, reason: SkipReason) -> ItemReport {
    ItemReport {
        refund_id,
        outcome: ItemOutcome::Skipped(reason),
    }
}

fn failed(refund_id: RefundRequestId, error: ActionError) -> ItemReport {
    tracing::warn!(refund_id = %refund_id, error = %error, "Refund action failed");
    ItemReport {
        refund_id,
        outcome: ItemOutcome::Failed(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(action: RefundAction, outcomes: Vec<ItemOutcome>) -> BatchReport {
        BatchReport {
            action,
            items: outcomes
                .into_iter()
                .zip(1..)
                .map(|(outcome, id)| ItemReport {
                    refund_id: RefundRequestId::new(id),
                    outcome,
                })
                .collect(),
        }
    }

    #[test]
    fn test_action_keys_round_trip() {
        for action in RefundAction::ALL {
            assert_eq!(RefundAction::from_key(action.key()), Some(action));
        }
        assert_eq!(RefundAction::from_key("delete_selected"), None);
    }

    #[test]
    fn test_mark_received_summary_counts_restock_failures() {
        let report = report(
            RefundAction::MarkProductReceived,
            vec![
                ItemOutcome::Updated,
                ItemOutcome::UpdatedWithError(ActionError::Restock(RepositoryError::NotFound)),
                ItemOutcome::Skipped(SkipReason::NotRestockable(RefundStatus::PendingReturn)),
            ],
        );

        let messages = report.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].level, MessageLevel::Error);
        assert_eq!(
            messages[0].text,
            "Error restocking items for refund #2: not found"
        );
        assert_eq!(
            messages[1],
            FlashMessage::success("2 refund(s) marked as product received and items restocked.")
        );
    }

    #[test]
    fn test_manual_restock_warns_when_nothing_restocked() {
        let report = report(
            RefundAction::ManualRestockItems,
            vec![ItemOutcome::Skipped(SkipReason::NotRestockable(
                RefundStatus::PendingReturn,
            ))],
        );
        assert_eq!(
            report.messages(),
            vec![FlashMessage::warning(
                "No items were restocked. Items may already be restocked or not marked as acceptable condition."
            )]
        );
    }

    #[test]
    fn test_complete_summary_text() {
        let report = report(RefundAction::CompleteRefund, vec![ItemOutcome::Updated]);
        assert_eq!(
            report.messages()[0].text,
            "1 refund(s) completed successfully. Earned rewards have been deducted. \
             Used rewards were NOT restored (use \"Restore rewards as goodwill\" if approved)."
        );
    }

    #[test]
    fn test_goodwill_summary_totals_restored_bucket_only() {
        let report = report(
            RefundAction::RestoreRewardsGoodwill,
            vec![
                ItemOutcome::Goodwill(GoodwillOutcome::Restored {
                    amount: Decimal::new(500, 2),
                }),
                ItemOutcome::Goodwill(GoodwillOutcome::Restored {
                    amount: Decimal::new(1_250, 2),
                }),
                ItemOutcome::Goodwill(GoodwillOutcome::AlreadyRestored),
                ItemOutcome::Goodwill(GoodwillOutcome::NoRewardsUsed),
                ItemOutcome::Goodwill(GoodwillOutcome::GuestOrder),
            ],
        );

        assert_eq!(
            report.messages(),
            vec![FlashMessage::success(
                "Rewards restored as goodwill gesture: 2 customer(s) had $17.50 in rewards restored, \
                 1 already had rewards restored, 1 had no rewards used in original purchase, \
                 1 were guest orders (no rewards to restore)"
            )]
        );
    }

    #[test]
    fn test_goodwill_summary_warns_when_nothing_restored() {
        let report = report(
            RefundAction::RestoreRewardsGoodwill,
            vec![ItemOutcome::Goodwill(GoodwillOutcome::GuestOrder)],
        );
        let messages = report.messages();
        assert_eq!(messages[0].level, MessageLevel::Warning);
        assert_eq!(
            messages[0].text,
            "No rewards restored: 1 were guest orders (no rewards to restore)"
        );
    }
}
