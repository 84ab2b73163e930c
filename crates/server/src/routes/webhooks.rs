//! PayPal subscription webhook.
//!
//! PayPal calls this endpoint directly, so it takes no user authentication and
//! answers with permissive CORS headers. Subscriptions are matched by their
//! PayPal id, recorded when the user approved checkout.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderName, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, instrument, warn};

use mealmind_core::SubscriptionStatus;

use crate::db::RepositoryError;
use crate::state::AppState;

/// Event sent when a subscription is created (first payment captured).
pub const SUBSCRIPTION_CREATED: &str = "BILLING.SUBSCRIPTION.CREATED";

/// Event sent when a subscription is cancelled.
pub const SUBSCRIPTION_CANCELLED: &str = "BILLING.SUBSCRIPTION.CANCELLED";

/// Headers browsers may send on cross-origin calls to this endpoint.
const ALLOWED_HEADERS: [HeaderName; 4] = [
    header::AUTHORIZATION,
    HeaderName::from_static("x-client-info"),
    HeaderName::from_static("apikey"),
    header::CONTENT_TYPE,
];

/// Webhook envelope. Only the fields used for subscription events are read.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub resource: serde_json::Value,
}

/// The `resource` of a subscription event.
#[derive(Debug, Deserialize)]
pub struct SubscriptionResource {
    pub id: String,
    #[serde(default)]
    pub billing_info: Option<BillingInfo>,
}

#[derive(Debug, Deserialize)]
pub struct BillingInfo {
    #[serde(default)]
    pub next_billing_time: Option<DateTime<Utc>>,
}

/// Errors while processing a webhook. All of them answer 500.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("malformed webhook body: {0}")]
    Body(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        error!(error = %self, "Error processing webhook");
        if matches!(self, Self::Repository(_)) {
            sentry::capture_error(&self);
        }
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        )
            .into_response()
    }
}

/// What a webhook event asks us to change.
#[derive(Debug, PartialEq, Eq)]
enum StatusChange {
    Activate {
        subscription_id: String,
        current_period_end: Option<DateTime<Utc>>,
    },
    Cancel {
        subscription_id: String,
    },
    Ignore,
}

impl StatusChange {
    fn from_event(event: WebhookEvent) -> Result<Self, serde_json::Error> {
        match event.event_type.as_str() {
            SUBSCRIPTION_CREATED => {
                let resource: SubscriptionResource = serde_json::from_value(event.resource)?;
                Ok(Self::Activate {
                    subscription_id: resource.id,
                    current_period_end: resource
                        .billing_info
                        .and_then(|info| info.next_billing_time),
                })
            }
            SUBSCRIPTION_CANCELLED => {
                let resource: SubscriptionResource = serde_json::from_value(event.resource)?;
                Ok(Self::Cancel {
                    subscription_id: resource.id,
                })
            }
            _ => Ok(Self::Ignore),
        }
    }
}

/// Router for `/api/webhooks`.
///
/// `POST /paypal` handles events, `OPTIONS` answers preflight, and any other
/// method gets `405 {"error": "Method not allowed"}`.
pub fn routes() -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers(ALLOWED_HEADERS);

    Router::new().route(
        "/paypal",
        post(paypal)
            .options(preflight)
            .fallback(method_not_allowed)
            .layer(cors),
    )
}

/// POST /api/webhooks/paypal
///
/// # Errors
///
/// Returns `WebhookError` (500) if the body is unreadable or the update fails.
#[instrument(skip_all)]
pub async fn paypal(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, WebhookError> {
    let event: WebhookEvent = serde_json::from_slice(&body)?;
    let event_type = event.event_type.clone();
    info!(event_type = %event_type, "Received PayPal webhook");

    let updated = match StatusChange::from_event(event)? {
        StatusChange::Activate {
            subscription_id,
            current_period_end,
        } => {
            state
                .store()
                .update_subscription_status(
                    &subscription_id,
                    SubscriptionStatus::Active,
                    current_period_end,
                )
                .await?
        }
        StatusChange::Cancel { subscription_id } => {
            state
                .store()
                .update_subscription_status(&subscription_id, SubscriptionStatus::Canceled, None)
                .await?
        }
        StatusChange::Ignore => {
            info!(event_type = %event_type, "Unhandled event type");
            return Ok(Json(json!({ "received": true })));
        }
    };

    if updated == 0 {
        warn!(event_type = %event_type, "Webhook matched no subscription");
    }

    Ok(Json(json!({ "received": true })))
}

/// OPTIONS /api/webhooks/paypal
async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn event(body: serde_json::Value) -> WebhookEvent {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_created_activates_with_period_end() {
        let change = StatusChange::from_event(event(json!({
            "event_type": "BILLING.SUBSCRIPTION.CREATED",
            "resource": {
                "id": "I-BW452GLLEP1G",
                "billing_info": { "next_billing_time": "2026-11-18T10:00:00Z" }
            }
        })))
        .unwrap();

        assert_eq!(
            change,
            StatusChange::Activate {
                subscription_id: "I-BW452GLLEP1G".into(),
                current_period_end: Some("2026-11-18T10:00:00Z".parse().unwrap()),
            }
        );
    }

    #[test]
    fn test_cancelled_cancels() {
        let change = StatusChange::from_event(event(json!({
            "event_type": "BILLING.SUBSCRIPTION.CANCELLED",
            "resource": { "id": "I-BW452GLLEP1G" }
        })))
        .unwrap();

        assert_eq!(
            change,
            StatusChange::Cancel {
                subscription_id: "I-BW452GLLEP1G".into()
            }
        );
    }

    #[test]
    fn test_unknown_event_ignored_regardless_of_resource() {
        let change = StatusChange::from_event(event(json!({
            "event_type": "PAYMENT.SALE.COMPLETED",
            "resource": "anything"
        })))
        .unwrap();
        assert_eq!(change, StatusChange::Ignore);
    }

    #[test]
    fn test_subscription_event_without_id_fails() {
        let result = StatusChange::from_event(event(json!({
            "event_type": "BILLING.SUBSCRIPTION.CANCELLED",
            "resource": {}
        })));
        assert!(result.is_err());
    }
}
