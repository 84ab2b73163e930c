//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Errors are rendered as JSON: `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mealmind_core::ImageError;
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::generator::GenerationError;
use crate::identity::IdentityError;
use crate::services::WorkspaceError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Recipe generation failed.
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Identity provider failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Uploaded image was rejected.
    #[error("Invalid image: {0}")]
    Image(#[from] ImageError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Free generations used up and no active subscription.
    #[error("Payment required: {0}")]
    PaymentRequired(String),

    /// Request conflicts with work already in progress.
    #[error("Conflict: {0}")]
    Conflict(String),

}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) | Self::Conflict(_) => {
                StatusCode::CONFLICT
            }
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Generation(GenerationError::RateLimited(_)) => StatusCode::TOO_MANY_REQUESTS,
            Self::Generation(_) | Self::Identity(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Image(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PaymentRequired(_) => StatusCode::PAYMENT_REQUIRED,
        }
    }

    /// Whether this error is a server-side failure worth reporting.
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Database(RepositoryError::Database(_) | RepositoryError::DataCorruption(_))
            | Self::Identity(_) => true,
            Self::Generation(err) => !matches!(err, GenerationError::RateLimited(_)),
            _ => false,
        }
    }

    /// Message safe to show to clients.
    fn client_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Database(_) => "Internal server error".to_string(),
            Self::Generation(GenerationError::RateLimited(_)) => {
                "The recipe service is busy. Please try again in a moment.".to_string()
            }
            Self::Generation(_) => "Failed to generate recipe. Please try again.".to_string(),
            Self::Identity(_) => "Authentication service unavailable".to_string(),
            Self::Image(err) => err.to_string(),
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::BadRequest(msg)
            | Self::PaymentRequired(msg)
            | Self::Conflict(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        // Don't expose internal error details to clients
        let message = self.client_message();

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<WorkspaceError> for AppError {
    fn from(err: WorkspaceError) -> Self {
        match err {
            WorkspaceError::NoImage => Self::BadRequest(err.to_string()),
            WorkspaceError::Busy => Self::Conflict(err.to_string()),
            WorkspaceError::PaymentRequired => Self::PaymentRequired(err.to_string()),
            WorkspaceError::RecipeNotFound => Self::NotFound("Recipe not found".to_string()),
            WorkspaceError::Generation(e) => Self::Generation(e),
            WorkspaceError::Repository(e) => Self::Database(e),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("workspace", "Generated recipe", Some(&[("model", "gemini-1.5-flash")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("recipe".to_string());
        assert_eq!(err.to_string(), "Not found: recipe");

        let err = AppError::BadRequest("name is required".to_string());
        assert_eq!(err.to_string(), "Bad request: name is required");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::PaymentRequired("test".to_string())),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Generation(GenerationError::RateLimited("quota".into()))),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Image(ImageError::NotDataUrl)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Generation(GenerationError::EmptyResponse)),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_workspace_error_mapping() {
        assert_eq!(
            get_status(WorkspaceError::NoImage.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(get_status(WorkspaceError::Busy.into()), StatusCode::CONFLICT);
        assert_eq!(
            get_status(WorkspaceError::PaymentRequired.into()),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            get_status(WorkspaceError::RecipeNotFound.into()),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption("bad row 42".into()));
        assert_eq!(err.client_message(), "Internal server error");

        let err = AppError::Generation(GenerationError::Api {
            status: 500,
            message: "backend exploded".into(),
        });
        assert!(!err.client_message().contains("exploded"));
    }
}
