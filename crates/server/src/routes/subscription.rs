//! Subscription and usage endpoints.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::UsageSummary;
use crate::state::AppState;

/// Body sent by the browser after the user approves a PayPal subscription.
#[derive(Debug, Deserialize)]
pub struct ApproveSubscriptionRequest {
    #[serde(alias = "subscriptionID")]
    pub subscription_id: String,
}

/// GET /api/subscription
///
/// # Errors
///
/// Returns `AppError::Database` if the subscription or counter cannot be read.
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<UsageSummary>> {
    Ok(Json(state.paywall().usage(user.id).await?))
}

/// POST /api/subscription
///
/// Records the approved subscription as `pending`; the payment webhook
/// activates it.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the subscription id is blank.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn approve(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(request): Json<ApproveSubscriptionRequest>,
) -> Result<Json<UsageSummary>> {
    let subscription_id = request.subscription_id.trim();
    if subscription_id.is_empty() {
        return Err(AppError::BadRequest(
            "Subscription id is required".to_string(),
        ));
    }

    state
        .store()
        .record_pending_subscription(user.id, subscription_id)
        .await?;
    info!(subscription_id, "Subscription recorded as pending");

    Ok(Json(state.paywall().usage(user.id).await?))
}
