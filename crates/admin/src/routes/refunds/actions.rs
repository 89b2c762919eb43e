//! Bulk action endpoint for the refund list.

use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Redirect},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    middleware::RequireWriteAccess,
    models::FlashMessage,
    services::RefundAction,
    state::AppState,
};

use super::super::notify;
use super::types::ActionForm;

/// Shown when the form is posted without a selection.
pub const NOTHING_SELECTED: &str =
    "Items must be selected in order to perform actions on them. No items have been changed.";

/// Shown when the posted action key is missing or unknown.
pub const NO_ACTION: &str = "No action selected.";

/// Run a bulk action over the selected refunds.
///
/// POST /refunds/actions
///
/// Per-refund errors and the summary are queued as flash messages; the
/// response always redirects back to the list.
#[instrument(skip(admin, state, session, body))]
pub async fn run_action(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    session: Session,
    body: Bytes,
) -> impl IntoResponse {
    let form = ActionForm::parse(&body);
    let target = form.redirect_target();

    if form.ids.is_empty() {
        notify(&session, [FlashMessage::warning(NOTHING_SELECTED)]).await;
        return Redirect::to(&target);
    }

    let Some(action) = form.action.as_deref().and_then(RefundAction::from_key) else {
        tracing::warn!(action = ?form.action, "Unknown refund action");
        notify(&session, [FlashMessage::warning(NO_ACTION)]).await;
        return Redirect::to(&target);
    };

    tracing::info!(
        %action,
        admin_id = %admin.id,
        selected = form.ids.len(),
        "Running refund bulk action"
    );

    match state.workflow().run(action, &form.ids).await {
        Ok(report) => notify(&session, report.messages()).await,
        Err(e) => {
            tracing::error!(%action, error = %e, "Failed to load refunds for bulk action");
            notify(
                &session,
                [FlashMessage::error(format!("Could not load the selected refunds: {e}"))],
            )
            .await;
        }
    }

    Redirect::to(&target)
}
