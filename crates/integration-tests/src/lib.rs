//! Integration tests for Tidemark.
//!
//! # Running Tests
//!
//! ```bash
//! # Workflow tests run against in-memory fixtures
//! cargo test -p tidemark-integration-tests
//!
//! # HTTP tests need both servers and a seeded database
//! cargo test -p tidemark-integration-tests -- --ignored
//! ```
//!
//! # Fixtures
//!
//! [`MemoryRefunds`] implements both [`RefundStore`] and [`RefundHooks`]
//! over a shared in-memory world, so a [`RefundWorkflow`] can be driven end
//! to end and its effects inspected afterwards. Individual refunds can be
//! told to fail restocking, rewards deduction, goodwill restoration or
//! saving.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use tidemark_admin::db::RepositoryError;
use tidemark_admin::models::refund::RefundRequest;
use tidemark_admin::services::{RefundHooks, RefundStore, RefundWorkflow};
use tidemark_core::{OrderId, ProductId, RefundReason, RefundRequestId, RefundStatus, UserId};

/// A refund line item as the fixtures track it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeItem {
    pub product: ProductId,
    pub quantity: i32,
    pub condition_acceptable: bool,
    pub restocked: bool,
}

impl FakeItem {
    #[must_use]
    pub const fn new(product: i32, quantity: i32) -> Self {
        Self {
            product: ProductId::new(product),
            quantity,
            condition_acceptable: false,
            restocked: false,
        }
    }

    #[must_use]
    pub const fn acceptable(mut self) -> Self {
        self.condition_acceptable = true;
        self
    }
}

/// Everything the workflow can touch.
#[derive(Debug, Default)]
pub struct World {
    pub refunds: BTreeMap<RefundRequestId, RefundRequest>,
    pub items: HashMap<RefundRequestId, Vec<FakeItem>>,
    pub stock: HashMap<ProductId, i32>,
    pub balances: HashMap<UserId, Decimal>,
    /// Rewards the customer earned on each refund's order.
    pub earned: HashMap<RefundRequestId, Decimal>,
    pub deducted: HashSet<RefundRequestId>,
    pub restored: HashSet<RefundRequestId>,
    pub rewards_calls: Vec<RefundRequestId>,
    pub failing_restock: HashSet<RefundRequestId>,
    pub failing_rewards: HashSet<RefundRequestId>,
    pub failing_goodwill: HashSet<RefundRequestId>,
    pub failing_saves: HashSet<RefundRequestId>,
}

/// In-memory [`RefundStore`] and [`RefundHooks`] sharing one [`World`].
#[derive(Debug, Clone, Default)]
pub struct MemoryRefunds {
    world: Arc<Mutex<World>>,
}

impl MemoryRefunds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the world for setup or inspection.
    ///
    /// # Panics
    ///
    /// Panics if a previous holder panicked.
    #[allow(clippy::unwrap_used)]
    pub fn world(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap()
    }

    /// A workflow over this store and these hooks.
    #[must_use]
    pub fn workflow(&self) -> RefundWorkflow<Self, Self> {
        RefundWorkflow::new(self.clone(), self.clone())
    }

    pub fn insert(&self, refund: RefundRequest, items: Vec<FakeItem>) {
        let mut world = self.world();
        if let Some(user_id) = refund.user_id {
            world.balances.entry(user_id).or_insert(Decimal::ZERO);
        }
        world.items.insert(refund.id, items);
        world.refunds.insert(refund.id, refund);
    }

    /// Current copy of a refund.
    ///
    /// # Panics
    ///
    /// Panics if the refund was never inserted.
    #[must_use]
    pub fn refund(&self, id: i32) -> RefundRequest {
        self.world()
            .refunds
            .get(&RefundRequestId::new(id))
            .cloned()
            .expect("refund exists")
    }

    #[must_use]
    pub fn items(&self, id: i32) -> Vec<FakeItem> {
        self.world()
            .items
            .get(&RefundRequestId::new(id))
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn stock(&self, product: i32) -> i32 {
        self.world()
            .stock
            .get(&ProductId::new(product))
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn balance(&self, user: i32) -> Decimal {
        self.world()
            .balances
            .get(&UserId::new(user))
            .copied()
            .unwrap_or_default()
    }
}

fn offline(what: &str) -> RepositoryError {
    RepositoryError::DataCorruption(format!("{what} offline"))
}

#[async_trait]
impl RefundStore for MemoryRefunds {
    async fn load_selected(
        &self,
        ids: &[RefundRequestId],
    ) -> Result<Vec<RefundRequest>, RepositoryError> {
        let world = self.world();
        Ok(world
            .refunds
            .values()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn save_transition(&self, refund: &RefundRequest) -> Result<(), RepositoryError> {
        let mut world = self.world();
        if world.failing_saves.contains(&refund.id) {
            return Err(offline("database"));
        }
        let stored = world
            .refunds
            .get_mut(&refund.id)
            .ok_or(RepositoryError::NotFound)?;
        stored.status = refund.status;
        stored.product_received_at = refund.product_received_at;
        stored.refund_completed_at = refund.refund_completed_at;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn accept_all_items(&self, id: RefundRequestId) -> Result<u64, RepositoryError> {
        let mut world = self.world();
        let items = world.items.entry(id).or_default();
        for item in items.iter_mut() {
            item.condition_acceptable = true;
        }
        Ok(items.len() as u64)
    }
}

#[async_trait]
impl RefundHooks for MemoryRefunds {
    async fn restock_refunded_items(&self, refund: &RefundRequest) -> Result<u64, RepositoryError> {
        let mut world = self.world();
        if world.failing_restock.contains(&refund.id) {
            return Err(offline("warehouse"));
        }

        let mut returned = Vec::new();
        for item in world.items.entry(refund.id).or_default().iter_mut() {
            if item.condition_acceptable && !item.restocked {
                item.restocked = true;
                returned.push((item.product, item.quantity));
            }
        }
        for (product, quantity) in &returned {
            *world.stock.entry(*product).or_default() += quantity;
        }
        Ok(returned.len() as u64)
    }

    async fn process_rewards_refund(
        &self,
        refund: &RefundRequest,
    ) -> Result<Decimal, RepositoryError> {
        let mut world = self.world();
        world.rewards_calls.push(refund.id);
        if world.failing_rewards.contains(&refund.id) {
            return Err(offline("rewards ledger"));
        }
        let Some(user_id) = refund.user_id else {
            return Ok(Decimal::ZERO);
        };
        if !world.deducted.insert(refund.id) {
            return Ok(Decimal::ZERO);
        }

        let earned = world.earned.get(&refund.id).copied().unwrap_or_default();
        let balance = world.balances.entry(user_id).or_default();
        let deduction = earned.min(*balance);
        *balance -= deduction;
        Ok(deduction)
    }

    async fn restore_used_rewards(&self, refund: &RefundRequest) -> Result<bool, RepositoryError> {
        let mut world = self.world();
        if world.failing_goodwill.contains(&refund.id) {
            return Err(offline("rewards ledger"));
        }
        let Some(user_id) = refund.user_id else {
            return Ok(false);
        };
        if !world.restored.insert(refund.id) {
            return Ok(false);
        }
        *world.balances.entry(user_id).or_default() += refund.rewards_used;
        Ok(true)
    }
}

/// A refund for registered user `id * 10` on order `id * 100`.
#[must_use]
pub fn refund(id: i32, status: RefundStatus) -> RefundRequest {
    let now = Utc::now();
    let user_id = UserId::new(id * 10);
    RefundRequest {
        id: RefundRequestId::new(id),
        order_id: Some(OrderId::new(id * 100)),
        user_id: Some(user_id),
        username: Some(format!("customer{id}")),
        customer_email: format!("customer{id}@example.com"),
        customer_name: format!("Customer {id}"),
        status,
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
        product_received_at: (status != RefundStatus::PendingReturn).then_some(now),
        refund_completed_at: (status == RefundStatus::Completed).then_some(now),
    }
}

/// The same refund, placed as a guest checkout.
#[must_use]
pub fn guest(mut refund: RefundRequest) -> RefundRequest {
    refund.user_id = None;
    refund.username = None;
    refund
}

/// The same refund, with `cents` of rewards spent on the original order.
#[must_use]
pub fn with_rewards_used(mut refund: RefundRequest, cents: i64) -> RefundRequest {
    refund.rewards_used = Decimal::new(cents, 2);
    refund
}

/// Selection helper: `ids(&[1, 2])`.
#[must_use]
pub fn ids(raw: &[i32]) -> Vec<RefundRequestId> {
    raw.iter().copied().map(RefundRequestId::new).collect()
}
