//! Refund detail page: view and save the operator-editable fields.

use askama::Template;
use axum::{
    body::Bytes,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use tidemark_core::RefundRequestId;

use crate::{
    db::RefundRepository,
    error::AppError,
    filters,
    middleware::{RequireAdminAuth, RequireWriteAccess, take_flash},
    models::FlashMessage,
    state::AppState,
};

use super::super::{Layout, notify, render_html};
use super::types::{RefundDetailView, RefundForm};

/// Refund detail template.
#[derive(Template)]
#[template(path = "refunds/show.html")]
pub struct RefundShowTemplate {
    pub layout: Layout,
    pub refund: RefundDetailView,
    pub can_write: bool,
}

/// Refund detail page handler.
///
/// GET /refunds/{id}
#[instrument(skip(admin, state, session))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let id = RefundRequestId::new(id);
    let detail = RefundRepository::new(state.pool())
        .get_with_items(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("refund request #{id}")))?;

    let template = RefundShowTemplate {
        layout: Layout::new(&admin, state.registry(), "refunds", take_flash(&session).await),
        refund: RefundDetailView::new(&detail.refund, &detail.items),
        can_write: admin.role.can_write(),
    };

    Ok(render_html(&template))
}

/// Save the refund form.
///
/// POST /refunds/{id}
///
/// A validation failure goes back to the form with an error message; a
/// successful save returns to the list.
#[instrument(skip(admin, state, session, body))]
pub async fn update(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    body: Bytes,
) -> Result<Response, AppError> {
    let id = RefundRequestId::new(id);
    let repo = RefundRepository::new(state.pool());
    let detail = repo
        .get_with_items(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("refund request #{id}")))?;

    let form = RefundForm::parse(&body);
    let (update, items) = match form.validate(&detail.refund, &detail.items) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::warn!(refund_id = %id, error = %e, "Refund edit rejected");
            notify(&session, [FlashMessage::error(format!("Please correct the error below: {e}."))])
                .await;
            return Ok(Redirect::to(&format!("/refunds/{id}")).into_response());
        }
    };

    repo.update(id, &update, &items).await?;

    tracing::info!(
        refund_id = %id,
        admin_id = %admin.id,
        status = %update.status,
        items = items.len(),
        "Refund request updated"
    );
    notify(
        &session,
        [FlashMessage::success(format!(
            "The refund request \u{201c}Refund #{id}\u{201d} was changed successfully."
        ))],
    )
    .await;

    Ok(Redirect::to("/refunds").into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use tidemark_core::{AdminUserId, Email, RefundReason, RefundStatus, UserId};

    use crate::models::refund::RefundRequest;
    use crate::models::{AdminRole, CurrentAdmin};
    use crate::registry::AdminRegistry;

    use super::*;

    fn refund(status: RefundStatus) -> RefundRequest {
        let now = Utc::now();
        RefundRequest {
            id: RefundRequestId::new(12),
            order_id: None,
            user_id: Some(UserId::new(4)),
            username: Some("june".to_string()),
            customer_email: "june@example.com".to_string(),
            customer_name: "June Park".to_string(),
            status,
            reason: RefundReason::WrongItem,
            reason_details: String::new(),
            refund_amount: Decimal::new(1_850, 2),
            rewards_used: Decimal::ZERO,
            tracking_number: String::new(),
            paypal_refund_id: String::new(),
            admin_notes: String::new(),
            rejection_reason: String::new(),
            rewards_restored_at: None,
            created_at: now,
            updated_at: now,
            product_received_at: Some(now),
            refund_completed_at: None,
        }
    }

    #[test]
    fn test_show_warns_that_status_edits_skip_side_effects() {
        let admin = CurrentAdmin {
            id: AdminUserId::new(1),
            email: Email::parse("ops@example.com").unwrap(),
            name: "Ops".to_string(),
            role: AdminRole::Admin,
        };
        let template = RefundShowTemplate {
            layout: Layout::new(&admin, &AdminRegistry::standard(), "refunds", vec![]),
            refund: RefundDetailView::new(&refund(RefundStatus::ProcessingRefund), &[]),
            can_write: true,
        };

        let html = template.render().unwrap();
        assert!(html.contains("Refund #12"));
        assert!(html.contains("Changing the status here saves it as is."));
        assert!(html.contains("Use the list actions for that."));
    }
}
