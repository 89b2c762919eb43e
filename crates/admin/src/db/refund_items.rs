//! Refund item repository.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use tidemark_core::{OrderItemId, ProductId, RefundItemId, RefundRequestId};

use super::{RepositoryError, like_pattern};
use crate::models::refund::{RefundItem, RefundItemFilter};

const ITEM_SELECT: &str = "\
    SELECT ri.id, ri.refund_request_id, ri.order_item_id, ri.quantity_to_refund, \
           ri.refund_amount, ri.condition_acceptable, ri.restocked, ri.condition_notes, \
           p.id AS product_id, p.title AS product_title \
    FROM refund_items ri \
    JOIN order_items oi ON oi.id = ri.order_item_id \
    LEFT JOIN products p ON p.id = oi.product_id";

#[derive(Debug, sqlx::FromRow)]
struct RefundItemRow {
    id: RefundItemId,
    refund_request_id: RefundRequestId,
    order_item_id: OrderItemId,
    quantity_to_refund: i32,
    refund_amount: Decimal,
    condition_acceptable: bool,
    restocked: bool,
    condition_notes: String,
    product_id: Option<ProductId>,
    product_title: Option<String>,
}

impl From<RefundItemRow> for RefundItem {
    fn from(row: RefundItemRow) -> Self {
        Self {
            id: row.id,
            refund_request_id: row.refund_request_id,
            order_item_id: row.order_item_id,
            quantity_to_refund: row.quantity_to_refund,
            refund_amount: row.refund_amount,
            condition_acceptable: row.condition_acceptable,
            restocked: row.restocked,
            condition_notes: row.condition_notes,
            product_id: row.product_id,
            product_title: row.product_title,
        }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &RefundItemFilter) {
    qb.push(" WHERE TRUE");
    if let Some(acceptable) = filter.condition_acceptable {
        qb.push(" AND ri.condition_acceptable = ").push_bind(acceptable);
    }
    if let Some(restocked) = filter.restocked {
        qb.push(" AND ri.restocked = ").push_bind(restocked);
    }
    if let Some(q) = filter.search.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = like_pattern(q);
        qb.push(" AND (ri.refund_request_id::text ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.title ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Repository for refund line items.
pub struct RefundItemRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RefundItemRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of items matching `filter`, newest refund first, plus the
    /// total number of matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &RefundItemFilter,
    ) -> Result<(Vec<RefundItem>, i64), RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(ITEM_SELECT);
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY ri.refund_request_id DESC, ri.id LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);
        let rows = qb
            .build_query_as::<RefundItemRow>()
            .fetch_all(self.pool)
            .await?;

        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM refund_items ri \
             JOIN order_items oi ON oi.id = ri.order_item_id \
             LEFT JOIN products p ON p.id = oi.product_id",
        );
        push_filters(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: RefundItemId) -> Result<Option<RefundItem>, RepositoryError> {
        let row = sqlx::query_as::<_, RefundItemRow>(&format!("{ITEM_SELECT} WHERE ri.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Items of one refund, in id order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_refund(
        &self,
        refund_id: RefundRequestId,
    ) -> Result<Vec<RefundItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, RefundItemRow>(&format!(
            "{ITEM_SELECT} WHERE ri.refund_request_id = $1 ORDER BY ri.id"
        ))
        .bind(refund_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Mark every item of a refund as in acceptable condition.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn accept_all(&self, refund_id: RefundRequestId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE refund_items SET condition_acceptable = TRUE WHERE refund_request_id = $1",
        )
        .bind(refund_id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
