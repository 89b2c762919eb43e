//! Postgres implementations of the refund side-effect helpers.
//!
//! Each helper runs in its own transaction and is safe to call twice:
//! restocking only picks up items not yet restocked, and the rewards ledger
//! has a unique index on `(refund_request_id, kind)`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use tidemark_core::{OrderItemId, RefundRequestId};

use super::RepositoryError;
use crate::models::refund::RefundRequest;
use crate::services::refunds::RefundHooks;

/// Share of the order's earned rewards attributable to the refunded amount,
/// rounded to cents and never more than was earned.
#[must_use]
pub fn earned_rewards_share(earned: Decimal, refund_amount: Decimal, order_total: Decimal) -> Decimal {
    if earned <= Decimal::ZERO || refund_amount <= Decimal::ZERO || order_total <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (earned * refund_amount / order_total)
        .round_dp(2)
        .min(earned)
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRewardsRow {
    total: Decimal,
    rewards_earned: Decimal,
}

/// [`RefundHooks`] over Postgres.
#[derive(Clone)]
pub struct PgRefundHooks {
    pool: PgPool,
}

impl PgRefundHooks {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefundHooks for PgRefundHooks {
    async fn restock_refunded_items(&self, refund: &RefundRequest) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let restocked = sqlx::query_as::<_, (OrderItemId, i32)>(
            "UPDATE refund_items SET restocked = TRUE \
             WHERE refund_request_id = $1 AND condition_acceptable AND NOT restocked \
             RETURNING order_item_id, quantity_to_refund",
        )
        .bind(refund.id)
        .fetch_all(&mut *tx)
        .await?;

        for (order_item_id, quantity) in &restocked {
            let result = sqlx::query(
                "UPDATE products SET stock = stock + $2 \
                 WHERE id = (SELECT product_id FROM order_items WHERE id = $1)",
            )
            .bind(order_item_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                tracing::warn!(
                    refund_id = %refund.id,
                    order_item_id = %order_item_id,
                    "Restocked item has no product; stock unchanged"
                );
            }
        }

        tx.commit().await?;

        let count = restocked.len() as u64;
        tracing::info!(refund_id = %refund.id, count, "Restocked refund items");
        Ok(count)
    }

    async fn process_rewards_refund(
        &self,
        refund: &RefundRequest,
    ) -> Result<Decimal, RepositoryError> {
        let Some(user_id) = refund.user_id else {
            return Ok(Decimal::ZERO);
        };
        let order_id = refund.order_id.ok_or(RepositoryError::NotFound)?;

        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, OrderRewardsRow>(
            "SELECT total, rewards_earned FROM orders WHERE id = $1",
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let deduction =
            earned_rewards_share(order.rewards_earned, refund.refund_amount, order.total);
        if deduction.is_zero() {
            return Ok(Decimal::ZERO);
        }

        let inserted = sqlx::query(
            "INSERT INTO reward_transactions (user_id, order_id, refund_request_id, kind, amount) \
             VALUES ($1, $2, $3, 'refund_deduction', $4) \
             ON CONFLICT (refund_request_id, kind) WHERE refund_request_id IS NOT NULL DO NOTHING",
        )
        .bind(user_id)
        .bind(order_id)
        .bind(refund.id)
        .bind(-deduction)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            tracing::debug!(refund_id = %refund.id, "Earned rewards already deducted");
            return Ok(Decimal::ZERO);
        }

        sqlx::query(
            "UPDATE users SET rewards_balance = GREATEST(rewards_balance - $2, 0) WHERE id = $1",
        )
        .bind(user_id)
        .bind(deduction)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            refund_id = %refund.id,
            user_id = %user_id,
            amount = %deduction,
            "Deducted earned rewards"
        );
        Ok(deduction)
    }

    async fn restore_used_rewards(&self, refund: &RefundRequest) -> Result<bool, RepositoryError> {
        let Some(user_id) = refund.user_id else {
            return Ok(false);
        };
        if refund.rewards_used <= Decimal::ZERO {
            return Ok(false);
        }

        let mut tx = self.pool.begin().await?;

        // Claiming the timestamp first makes a second call a no-op
        let claimed = sqlx::query_scalar::<_, RefundRequestId>(
            "UPDATE refund_requests SET rewards_restored_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND rewards_restored_at IS NULL \
             RETURNING id",
        )
        .bind(refund.id)
        .fetch_optional(&mut *tx)
        .await?;

        if claimed.is_none() {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO reward_transactions (user_id, order_id, refund_request_id, kind, amount) \
             VALUES ($1, $2, $3, 'goodwill_restore', $4) \
             ON CONFLICT (refund_request_id, kind) WHERE refund_request_id IS NOT NULL DO NOTHING",
        )
        .bind(user_id)
        .bind(refund.order_id)
        .bind(refund.id)
        .bind(refund.rewards_used)
        .execute(&mut *tx)
        .await?;

        let credited = sqlx::query(
            "UPDATE users SET rewards_balance = rewards_balance + $2 WHERE id = $1",
        )
        .bind(user_id)
        .bind(refund.rewards_used)
        .execute(&mut *tx)
        .await?;

        if credited.rows_affected() == 0 {
            return Err(RepositoryError::DataCorruption(format!(
                "user #{user_id} on refund #{} does not exist",
                refund.id
            )));
        }

        tx.commit().await?;

        tracing::info!(
            refund_id = %refund.id,
            user_id = %user_id,
            amount = %refund.rewards_used,
            "Restored used rewards as goodwill"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_is_proportional_to_refund() {
        // $10 earned on a $100 order, $40 refunded
        let share = earned_rewards_share(
            Decimal::new(1_000, 2),
            Decimal::new(4_000, 2),
            Decimal::new(10_000, 2),
        );
        assert_eq!(share, Decimal::new(400, 2));
    }

    #[test]
    fn test_share_is_capped_at_earned() {
        let share = earned_rewards_share(
            Decimal::new(500, 2),
            Decimal::new(20_000, 2),
            Decimal::new(10_000, 2),
        );
        assert_eq!(share, Decimal::new(500, 2));
    }

    #[test]
    fn test_share_zero_without_earnings_or_total() {
        let ten = Decimal::new(10, 0);
        assert_eq!(earned_rewards_share(Decimal::ZERO, ten, ten), Decimal::ZERO);
        assert_eq!(earned_rewards_share(ten, ten, Decimal::ZERO), Decimal::ZERO);
        assert_eq!(earned_rewards_share(ten, Decimal::ZERO, ten), Decimal::ZERO);
    }

    #[test]
    fn test_share_rounds_to_cents() {
        // 10 * 1 / 3 = 3.333...
        let share = earned_rewards_share(
            Decimal::new(10, 0),
            Decimal::new(1, 0),
            Decimal::new(3, 0),
        );
        assert_eq!(share, Decimal::new(333, 2));
    }
}
