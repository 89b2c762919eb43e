//! Refund request repository.
//!
//! `RefundRepository` backs the list and detail pages. `PgRefundStore` is the
//! workflow's view of the same tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use tidemark_core::{OrderId, RefundReason, RefundRequestId, RefundStatus, UserId};

use super::refund_items::RefundItemRepository;
use super::{RepositoryError, like_pattern};
use crate::models::refund::{
    RefundFilter, RefundItemUpdate, RefundRequest, RefundUpdate, RefundWithItems,
};
use crate::services::refunds::RefundStore;

const REFUND_SELECT: &str = "\
    SELECT r.id, r.order_id, r.user_id, u.username, r.customer_email, r.customer_name, \
           r.status, r.reason, r.reason_details, r.refund_amount, r.rewards_used, \
           r.tracking_number, r.paypal_refund_id, r.admin_notes, r.rejection_reason, \
           r.rewards_restored_at, r.created_at, r.updated_at, \
           r.product_received_at, r.refund_completed_at \
    FROM refund_requests r \
    LEFT JOIN users u ON u.id = r.user_id";

#[derive(Debug, sqlx::FromRow)]
struct RefundRow {
    id: RefundRequestId,
    order_id: Option<OrderId>,
    user_id: Option<UserId>,
    username: Option<String>,
    customer_email: String,
    customer_name: String,
    status: RefundStatus,
    reason: RefundReason,
    reason_details: String,
    refund_amount: Decimal,
    rewards_used: Decimal,
    tracking_number: String,
    paypal_refund_id: String,
    admin_notes: String,
    rejection_reason: String,
    rewards_restored_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    product_received_at: Option<DateTime<Utc>>,
    refund_completed_at: Option<DateTime<Utc>>,
}

impl From<RefundRow> for RefundRequest {
    fn from(row: RefundRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            user_id: row.user_id,
            username: row.username,
            customer_email: row.customer_email,
            customer_name: row.customer_name,
            status: row.status,
            reason: row.reason,
            reason_details: row.reason_details,
            refund_amount: row.refund_amount,
            rewards_used: row.rewards_used,
            tracking_number: row.tracking_number,
            paypal_refund_id: row.paypal_refund_id,
            admin_notes: row.admin_notes,
            rejection_reason: row.rejection_reason,
            rewards_restored_at: row.rewards_restored_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            product_received_at: row.product_received_at,
            refund_completed_at: row.refund_completed_at,
        }
    }
}

/// Append the WHERE clause for `filter` (without ORDER/LIMIT).
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &RefundFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND r.status = ").push_bind(status);
    }
    if let Some(reason) = filter.reason {
        qb.push(" AND r.reason = ").push_bind(reason);
    }
    if let Some(since) = filter.created_since {
        qb.push(" AND r.created_at >= ").push_bind(since);
    }
    if let Some(year) = filter.year {
        qb.push(" AND EXTRACT(YEAR FROM r.created_at)::int = ").push_bind(year);
    }
    if let Some(month) = filter.month {
        qb.push(" AND EXTRACT(MONTH FROM r.created_at)::int = ").push_bind(month);
    }
    if let Some(q) = filter.search.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = like_pattern(q);
        qb.push(" AND (r.order_id::text ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR r.customer_email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR r.customer_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.username ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Repository for refund request pages.
pub struct RefundRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RefundRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of refunds matching `filter`, newest first, plus the total
    /// number of matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &RefundFilter,
    ) -> Result<(Vec<RefundRequest>, i64), RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(REFUND_SELECT);
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY r.created_at DESC, r.id DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);
        let rows = qb.build_query_as::<RefundRow>().fetch_all(self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM refund_requests r LEFT JOIN users u ON u.id = r.user_id",
        );
        push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Years that have refunds, newest first (date hierarchy).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn years(&self) -> Result<Vec<i32>, RepositoryError> {
        let years = sqlx::query_scalar::<_, i32>(
            "SELECT DISTINCT EXTRACT(YEAR FROM created_at)::int AS year \
             FROM refund_requests ORDER BY year DESC",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(years)
    }

    /// Months of `year` that have refunds, in calendar order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn months(&self, year: i32) -> Result<Vec<i32>, RepositoryError> {
        let months = sqlx::query_scalar::<_, i32>(
            "SELECT DISTINCT EXTRACT(MONTH FROM created_at)::int AS month \
             FROM refund_requests \
             WHERE EXTRACT(YEAR FROM created_at)::int = $1 \
             ORDER BY month",
        )
        .bind(year)
        .fetch_all(self.pool)
        .await?;
        Ok(months)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: RefundRequestId) -> Result<Option<RefundRequest>, RepositoryError> {
        let row = sqlx::query_as::<_, RefundRow>(&format!("{REFUND_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// A refund with its line items, for the detail page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_with_items(
        &self,
        id: RefundRequestId,
    ) -> Result<Option<RefundWithItems>, RepositoryError> {
        let Some(refund) = self.get(id).await? else {
            return Ok(None);
        };
        let items = RefundItemRepository::new(self.pool).for_refund(id).await?;
        Ok(Some(RefundWithItems { refund, items }))
    }

    /// Refunds selected by id, in id order. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(
        &self,
        ids: &[RefundRequestId],
    ) -> Result<Vec<RefundRequest>, RepositoryError> {
        let rows = sqlx::query_as::<_, RefundRow>(&format!(
            "{REFUND_SELECT} WHERE r.id = ANY($1) ORDER BY r.id"
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Save the operator-editable fields and inline item edits in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the refund doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: RefundRequestId,
        update: &RefundUpdate,
        items: &[RefundItemUpdate],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE refund_requests \
             SET status = $2, reason = $3, reason_details = $4, tracking_number = $5, \
                 paypal_refund_id = $6, admin_notes = $7, rejection_reason = $8, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(update.status)
        .bind(update.reason)
        .bind(&update.reason_details)
        .bind(&update.tracking_number)
        .bind(&update.paypal_refund_id)
        .bind(&update.admin_notes)
        .bind(&update.rejection_reason)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        for item in items {
            // Scoped to the refund so a forged item id can't touch another refund
            sqlx::query(
                "UPDATE refund_items \
                 SET condition_acceptable = $3, condition_notes = $4, restocked = $5 \
                 WHERE id = $1 AND refund_request_id = $2",
            )
            .bind(item.id)
            .bind(id)
            .bind(item.condition_acceptable)
            .bind(&item.condition_notes)
            .bind(item.restocked)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Persist a workflow status change and its timestamps.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the refund doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn save_transition(&self, refund: &RefundRequest) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE refund_requests \
             SET status = $2, product_received_at = $3, refund_completed_at = $4, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(refund.id)
        .bind(refund.status)
        .bind(refund.product_received_at)
        .bind(refund.refund_completed_at)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Status counts for the dashboard, in lifecycle order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_status(&self) -> Result<Vec<(RefundStatus, i64)>, RepositoryError> {
        let rows = sqlx::query_as::<_, (RefundStatus, i64)>(
            "SELECT status, COUNT(*) FROM refund_requests GROUP BY status",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(RefundStatus::ALL
            .into_iter()
            .map(|status| {
                let count = rows
                    .iter()
                    .find(|(s, _)| *s == status)
                    .map_or(0, |(_, n)| *n);
                (status, count)
            })
            .collect())
    }
}

/// [`RefundStore`] over Postgres.
#[derive(Clone)]
pub struct PgRefundStore {
    pool: PgPool,
}

impl PgRefundStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefundStore for PgRefundStore {
    async fn load_selected(
        &self,
        ids: &[RefundRequestId],
    ) -> Result<Vec<RefundRequest>, RepositoryError> {
        RefundRepository::new(&self.pool).get_many(ids).await
    }

    async fn save_transition(&self, refund: &RefundRequest) -> Result<(), RepositoryError> {
        RefundRepository::new(&self.pool)
            .save_transition(refund)
            .await
    }

    async fn accept_all_items(&self, id: RefundRequestId) -> Result<u64, RepositoryError> {
        RefundItemRepository::new(&self.pool).accept_all(id).await
    }
}
