//! Access-token validation interface.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use mealmind_core::UserId;

/// A user whose access token was accepted by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub email: Option<String>,
}

/// Errors that can occur while validating an access token.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The token is missing, expired, or forged.
    #[error("invalid or expired access token")]
    InvalidToken,

    /// The identity provider returned an unexpected error.
    #[error("identity provider error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or message.
        message: String,
    },

    /// Failed to parse the provider response.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Resolves bearer access tokens to users.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Validate `access_token` and return its user.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidToken`] when the provider rejects the
    /// token, or another variant when the provider cannot be reached.
    async fn authenticate(&self, access_token: &str) -> Result<AuthenticatedUser, IdentityError>;
}
