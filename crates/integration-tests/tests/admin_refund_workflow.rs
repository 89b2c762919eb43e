//! Refund bulk actions driven end to end against in-memory fixtures.
//!
//! These exercise the real `RefundWorkflow`: state gating, per-refund
//! failure isolation, side effects on stock and reward balances, and the
//! operator messages each action produces.

use rust_decimal::Decimal;

use tidemark_admin::models::{FlashMessage, MessageLevel};
use tidemark_admin::services::{
    ActionError, GoodwillOutcome, ItemOutcome, RefundAction, SkipReason,
};
use tidemark_core::{RefundRequestId, RefundStatus};
use tidemark_integration_tests::{
    FakeItem, MemoryRefunds, guest, ids, refund, with_rewards_used,
};

fn texts(messages: &[FlashMessage]) -> Vec<&str> {
    messages.iter().map(|m| m.text.as_str()).collect()
}

// =============================================================================
// Mark product received & restock
// =============================================================================

#[tokio::test]
async fn test_mark_received_leaves_other_statuses_untouched() {
    let store = MemoryRefunds::new();
    let others = [
        RefundStatus::ProductReceived,
        RefundStatus::ProcessingRefund,
        RefundStatus::Completed,
        RefundStatus::Rejected,
    ];
    for (id, status) in (1..).zip(others) {
        store.insert(refund(id, status), vec![FakeItem::new(7, 1)]);
    }
    let before: Vec<_> = (1..=4).map(|id| store.refund(id)).collect();

    let report = store
        .workflow()
        .run(RefundAction::MarkProductReceived, &ids(&[1, 2, 3, 4]))
        .await
        .unwrap();

    assert_eq!(report.updated(), 0);
    assert_eq!(report.skipped(), 4);
    for (id, old) in (1..).zip(before) {
        let now = store.refund(id);
        assert_eq!(now.status, old.status);
        assert_eq!(now.product_received_at, old.product_received_at);
        assert_eq!(now.refund_completed_at, old.refund_completed_at);
        assert!(!store.items(id)[0].condition_acceptable);
    }
    assert_eq!(store.stock(7), 0);
}

#[tokio::test]
async fn test_mark_received_accepts_every_item_and_restocks() {
    let store = MemoryRefunds::new();
    store.insert(
        refund(1, RefundStatus::PendingReturn),
        vec![FakeItem::new(7, 2), FakeItem::new(8, 1), FakeItem::new(9, 3)],
    );

    let report = store
        .workflow()
        .run(RefundAction::MarkProductReceived, &ids(&[1]))
        .await
        .unwrap();

    assert_eq!(report.updated(), 1);
    let refund = store.refund(1);
    assert_eq!(refund.status, RefundStatus::ProductReceived);
    assert!(refund.product_received_at.is_some());

    let items = store.items(1);
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|i| i.condition_acceptable && i.restocked));
    assert_eq!(store.stock(7), 2);
    assert_eq!(store.stock(8), 1);
    assert_eq!(store.stock(9), 3);
}

#[tokio::test]
async fn test_mark_received_batch_of_three_updates_two() {
    let store = MemoryRefunds::new();
    store.insert(refund(1, RefundStatus::PendingReturn), vec![FakeItem::new(7, 1)]);
    store.insert(refund(2, RefundStatus::PendingReturn), vec![FakeItem::new(7, 1)]);
    store.insert(refund(3, RefundStatus::ProcessingRefund), vec![FakeItem::new(7, 1)]);
    let third = store.refund(3);

    let report = store
        .workflow()
        .run(RefundAction::MarkProductReceived, &ids(&[1, 2, 3]))
        .await
        .unwrap();

    assert_eq!(report.updated(), 2);
    assert_eq!(
        report.messages(),
        vec![FlashMessage::success(
            "2 refund(s) marked as product received and items restocked."
        )]
    );
    assert_eq!(store.refund(1).status, RefundStatus::ProductReceived);
    assert_eq!(store.refund(2).status, RefundStatus::ProductReceived);

    let untouched = store.refund(3);
    assert_eq!(untouched.status, third.status);
    assert_eq!(untouched.updated_at, third.updated_at);
    assert!(matches!(
        report.outcome(RefundRequestId::new(3)),
        Some(ItemOutcome::Skipped(SkipReason::Transition(_)))
    ));
}

#[tokio::test]
async fn test_restock_failure_is_reported_and_batch_continues() {
    let store = MemoryRefunds::new();
    store.insert(refund(1, RefundStatus::PendingReturn), vec![FakeItem::new(7, 1)]);
    store.insert(refund(2, RefundStatus::PendingReturn), vec![FakeItem::new(8, 2)]);
    store
        .world()
        .failing_restock
        .insert(RefundRequestId::new(1));

    let report = store
        .workflow()
        .run(RefundAction::MarkProductReceived, &ids(&[1, 2]))
        .await
        .unwrap();

    // The status change is saved before restocking, so it sticks
    assert_eq!(store.refund(1).status, RefundStatus::ProductReceived);
    assert_eq!(store.refund(2).status, RefundStatus::ProductReceived);
    assert_eq!(store.stock(7), 0);
    assert_eq!(store.stock(8), 2);

    let messages = report.messages();
    assert_eq!(
        texts(&messages),
        vec![
            "Error restocking items for refund #1: data corruption: warehouse offline",
            "2 refund(s) marked as product received and items restocked.",
        ]
    );
    assert_eq!(messages[0].level, MessageLevel::Error);
    assert_eq!(report.failed(), 1);
}

#[tokio::test]
async fn test_failed_save_leaves_refund_unchanged() {
    let store = MemoryRefunds::new();
    store.insert(refund(1, RefundStatus::PendingReturn), vec![FakeItem::new(7, 1)]);
    store.world().failing_saves.insert(RefundRequestId::new(1));

    let report = store
        .workflow()
        .run(RefundAction::MarkProductReceived, &ids(&[1]))
        .await
        .unwrap();

    assert_eq!(report.updated(), 0);
    assert_eq!(store.refund(1).status, RefundStatus::PendingReturn);
    assert!(!store.items(1)[0].restocked);
    assert_eq!(
        texts(&report.messages())[0],
        "Error updating refund #1: data corruption: database offline"
    );
}

// =============================================================================
// Manual restock
// =============================================================================

#[tokio::test]
async fn test_manual_restock_only_touches_acceptable_unrestocked_items() {
    let store = MemoryRefunds::new();
    store.insert(
        refund(1, RefundStatus::ProductReceived),
        vec![FakeItem::new(7, 2).acceptable(), FakeItem::new(8, 5)],
    );
    store.insert(
        refund(2, RefundStatus::PendingReturn),
        vec![FakeItem::new(9, 1).acceptable()],
    );

    let workflow = store.workflow();
    let first = workflow
        .run(RefundAction::ManualRestockItems, &ids(&[1, 2]))
        .await
        .unwrap();
    assert_eq!(first.restocked(), 1);
    assert_eq!(first.skipped(), 1);
    assert_eq!(
        first.messages(),
        vec![FlashMessage::success("Manually restocked items for 1 refund(s).")]
    );
    assert_eq!(store.stock(7), 2);
    assert_eq!(store.stock(8), 0);
    assert_eq!(store.stock(9), 0);

    // Running again adds nothing
    workflow
        .run(RefundAction::ManualRestockItems, &ids(&[1]))
        .await
        .unwrap();
    assert_eq!(store.stock(7), 2);
    assert_eq!(store.refund(1).status, RefundStatus::ProductReceived);
}

#[tokio::test]
async fn test_manual_restock_on_pending_only_warns() {
    let store = MemoryRefunds::new();
    store.insert(refund(1, RefundStatus::PendingReturn), vec![]);

    let report = store
        .workflow()
        .run(RefundAction::ManualRestockItems, &ids(&[1]))
        .await
        .unwrap();

    assert_eq!(report.messages()[0].level, MessageLevel::Warning);
    assert!(matches!(
        report.outcome(RefundRequestId::new(1)),
        Some(ItemOutcome::Skipped(SkipReason::NotRestockable(
            RefundStatus::PendingReturn
        )))
    ));
}

#[tokio::test]
async fn test_manual_restock_failure_is_reported_and_batch_continues() {
    let store = MemoryRefunds::new();
    store.insert(
        refund(1, RefundStatus::ProductReceived),
        vec![FakeItem::new(7, 2).acceptable()],
    );
    store.insert(
        refund(2, RefundStatus::ProcessingRefund),
        vec![FakeItem::new(8, 3).acceptable()],
    );
    store
        .world()
        .failing_restock
        .insert(RefundRequestId::new(1));

    let report = store
        .workflow()
        .run(RefundAction::ManualRestockItems, &ids(&[1, 2]))
        .await
        .unwrap();

    assert_eq!(report.failed(), 1);
    assert_eq!(report.restocked(), 1);
    let messages = report.messages();
    assert_eq!(
        texts(&messages),
        vec![
            "Error restocking items for refund #1: data corruption: warehouse offline",
            "Manually restocked items for 1 refund(s).",
        ]
    );
    assert_eq!(messages[0].level, MessageLevel::Error);
    assert_eq!(messages[1].level, MessageLevel::Success);

    assert!(!store.items(1)[0].restocked);
    assert_eq!(store.stock(7), 0);
    assert!(store.items(2)[0].restocked);
    assert_eq!(store.stock(8), 3);
    // Restocking never moves the status
    assert_eq!(store.refund(1).status, RefundStatus::ProductReceived);
    assert_eq!(store.refund(2).status, RefundStatus::ProcessingRefund);
}

// =============================================================================
// Processing, completion and rejection
// =============================================================================

#[tokio::test]
async fn test_processing_requires_product_received() {
    let store = MemoryRefunds::new();
    store.insert(refund(1, RefundStatus::ProductReceived), vec![]);
    store.insert(refund(2, RefundStatus::PendingReturn), vec![]);

    let report = store
        .workflow()
        .run(RefundAction::ProcessPaypalRefund, &ids(&[1, 2]))
        .await
        .unwrap();

    assert_eq!(store.refund(1).status, RefundStatus::ProcessingRefund);
    assert_eq!(store.refund(2).status, RefundStatus::PendingReturn);
    assert_eq!(
        texts(&report.messages()),
        vec![
            "1 refund(s) marked as processing. Please process refunds in PayPal dashboard and enter transaction IDs."
        ]
    );
}

#[tokio::test]
async fn test_complete_guest_refund_skips_rewards() {
    let store = MemoryRefunds::new();
    store.insert(guest(refund(1, RefundStatus::ProcessingRefund)), vec![]);

    let report = store
        .workflow()
        .run(RefundAction::CompleteRefund, &ids(&[1]))
        .await
        .unwrap();

    assert_eq!(report.updated(), 1);
    let refund = store.refund(1);
    assert_eq!(refund.status, RefundStatus::Completed);
    assert!(refund.refund_completed_at.is_some());
    assert!(store.world().rewards_calls.is_empty());
}

#[tokio::test]
async fn test_complete_deducts_earned_rewards_only() {
    let store = MemoryRefunds::new();
    store.insert(
        with_rewards_used(refund(1, RefundStatus::ProcessingRefund), 500),
        vec![],
    );
    {
        let mut world = store.world();
        world
            .balances
            .insert(tidemark_core::UserId::new(10), Decimal::new(2_000, 2));
        world
            .earned
            .insert(RefundRequestId::new(1), Decimal::new(400, 2));
    }

    store
        .workflow()
        .run(RefundAction::CompleteRefund, &ids(&[1]))
        .await
        .unwrap();

    assert_eq!(store.refund(1).status, RefundStatus::Completed);
    // 20.00 - 4.00 earned; the 5.00 spent is not given back
    assert_eq!(store.balance(10), Decimal::new(1_600, 2));
    assert!(store.world().restored.is_empty());
}

#[tokio::test]
async fn test_complete_rewards_failure_leaves_refund_and_continues() {
    let store = MemoryRefunds::new();
    store.insert(refund(1, RefundStatus::ProcessingRefund), vec![]);
    store.insert(refund(2, RefundStatus::ProcessingRefund), vec![]);
    store
        .world()
        .failing_rewards
        .insert(RefundRequestId::new(1));

    let report = store
        .workflow()
        .run(RefundAction::CompleteRefund, &ids(&[1, 2]))
        .await
        .unwrap();

    let failed = store.refund(1);
    assert_eq!(failed.status, RefundStatus::ProcessingRefund);
    assert!(failed.refund_completed_at.is_none());
    assert_eq!(store.refund(2).status, RefundStatus::Completed);

    let messages = report.messages();
    assert_eq!(
        messages[0],
        FlashMessage::error(
            "Error processing rewards for refund #1: data corruption: rewards ledger offline"
        )
    );
    assert!(messages[1].text.starts_with("1 refund(s) completed successfully."));
}

#[tokio::test]
async fn test_reject_skips_terminal_refunds() {
    let store = MemoryRefunds::new();
    store.insert(refund(1, RefundStatus::Completed), vec![]);
    store.insert(refund(2, RefundStatus::Rejected), vec![]);
    store.insert(refund(3, RefundStatus::PendingReturn), vec![]);
    store.insert(refund(4, RefundStatus::ProcessingRefund), vec![]);
    let completed = store.refund(1);

    let report = store
        .workflow()
        .run(RefundAction::RejectRefund, &ids(&[1, 2, 3, 4]))
        .await
        .unwrap();

    assert_eq!(store.refund(1).status, RefundStatus::Completed);
    assert_eq!(store.refund(1).updated_at, completed.updated_at);
    assert_eq!(store.refund(3).status, RefundStatus::Rejected);
    assert_eq!(store.refund(4).status, RefundStatus::Rejected);
    assert_eq!(
        report.messages(),
        vec![FlashMessage::warning(
            "2 refund(s) rejected. Please add rejection reason in admin notes."
        )]
    );
}

#[tokio::test]
async fn test_unknown_ids_are_ignored() {
    let store = MemoryRefunds::new();
    store.insert(refund(1, RefundStatus::PendingReturn), vec![]);

    let report = store
        .workflow()
        .run(RefundAction::RejectRefund, &ids(&[1, 99]))
        .await
        .unwrap();

    assert_eq!(report.items.len(), 1);
    assert_eq!(report.updated(), 1);
}

// =============================================================================
// Goodwill restoration
// =============================================================================

#[tokio::test]
async fn test_goodwill_twice_never_double_credits() {
    let store = MemoryRefunds::new();
    store.insert(
        with_rewards_used(refund(1, RefundStatus::Completed), 750),
        vec![],
    );
    let workflow = store.workflow();

    let first = workflow
        .run(RefundAction::RestoreRewardsGoodwill, &ids(&[1]))
        .await
        .unwrap();
    assert_eq!(
        first.messages(),
        vec![FlashMessage::success(
            "Rewards restored as goodwill gesture: 1 customer(s) had $7.50 in rewards restored"
        )]
    );

    let second = workflow
        .run(RefundAction::RestoreRewardsGoodwill, &ids(&[1]))
        .await
        .unwrap();
    assert!(matches!(
        second.outcome(RefundRequestId::new(1)),
        Some(ItemOutcome::Goodwill(GoodwillOutcome::AlreadyRestored))
    ));
    assert_eq!(
        second.messages(),
        vec![FlashMessage::warning(
            "No rewards restored: 1 already had rewards restored"
        )]
    );
    assert_eq!(store.balance(10), Decimal::new(750, 2));
}

#[tokio::test]
async fn test_goodwill_reports_each_bucket() {
    let store = MemoryRefunds::new();
    store.insert(
        with_rewards_used(refund(1, RefundStatus::PendingReturn), 500),
        vec![],
    );
    store.insert(
        with_rewards_used(refund(2, RefundStatus::Rejected), 1_000),
        vec![],
    );
    store.insert(refund(3, RefundStatus::Completed), vec![]);
    store.insert(
        guest(with_rewards_used(refund(4, RefundStatus::Completed), 300)),
        vec![],
    );

    let report = store
        .workflow()
        .run(RefundAction::RestoreRewardsGoodwill, &ids(&[1, 2, 3, 4]))
        .await
        .unwrap();

    assert_eq!(
        texts(&report.messages()),
        vec![
            "Rewards restored as goodwill gesture: 2 customer(s) had $15.00 in rewards restored, \
             1 had no rewards used in original purchase, 1 were guest orders (no rewards to restore)"
        ]
    );
    // Goodwill never moves the status
    assert_eq!(store.refund(1).status, RefundStatus::PendingReturn);
    assert_eq!(store.refund(2).status, RefundStatus::Rejected);
    assert_eq!(store.balance(10), Decimal::new(500, 2));
    assert_eq!(store.balance(20), Decimal::new(1_000, 2));
}

#[tokio::test]
async fn test_goodwill_failure_is_reported_and_batch_continues() {
    let store = MemoryRefunds::new();
    store.insert(
        with_rewards_used(refund(1, RefundStatus::Completed), 600),
        vec![],
    );
    store.insert(
        with_rewards_used(refund(2, RefundStatus::Completed), 250),
        vec![],
    );
    store
        .world()
        .failing_goodwill
        .insert(RefundRequestId::new(1));

    let report = store
        .workflow()
        .run(RefundAction::RestoreRewardsGoodwill, &ids(&[1, 2]))
        .await
        .unwrap();

    assert!(matches!(
        report.outcome(RefundRequestId::new(1)),
        Some(ItemOutcome::Failed(ActionError::Goodwill(_)))
    ));
    assert_eq!(report.failed(), 1);
    let messages = report.messages();
    assert_eq!(
        texts(&messages),
        vec![
            "Error restoring rewards for refund #1: data corruption: rewards ledger offline",
            "Rewards restored as goodwill gesture: 1 customer(s) had $2.50 in rewards restored",
        ]
    );
    assert_eq!(messages[0].level, MessageLevel::Error);

    assert_eq!(store.balance(10), Decimal::ZERO);
    assert_eq!(store.balance(20), Decimal::new(250, 2));

    // Once the ledger is back, the failed refund can still be restored
    store
        .world()
        .failing_goodwill
        .remove(&RefundRequestId::new(1));
    let retry = store
        .workflow()
        .run(RefundAction::RestoreRewardsGoodwill, &ids(&[1]))
        .await
        .unwrap();
    assert_eq!(retry.failed(), 0);
    assert_eq!(store.balance(10), Decimal::new(600, 2));
}
