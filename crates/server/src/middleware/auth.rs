//! Authentication extractor.
//!
//! Requests carry a Supabase access token as `Authorization: Bearer <token>`.
//! The token is validated by the configured identity provider on each request
//! (the Supabase client caches results briefly).

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use tracing::debug;

use crate::error::{AppError, set_sentry_user};
use crate::identity::{AuthenticatedUser, IdentityError};
use crate::state::AppState;

/// Message returned when no valid session is present.
pub const LOGIN_REQUIRED: &str = "Please log in";

/// Extractor that requires an authenticated user.
///
/// Rejects with `401 {"error": "Please log in"}` when the header is missing or
/// the token is rejected.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.id)
/// }
/// ```
pub struct RequireUser(pub AuthenticatedUser);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized(LOGIN_REQUIRED.to_string()))?;

        let user = state
            .identity()
            .authenticate(token)
            .await
            .map_err(|e| match e {
                IdentityError::InvalidToken => {
                    debug!("Rejected access token");
                    AppError::Unauthorized(LOGIN_REQUIRED.to_string())
                }
                other => AppError::Identity(other),
            })?;

        set_sentry_user(&user.id, user.email.as_deref());
        Ok(Self(user))
    }
}

/// The bearer token from an `Authorization` header, if present and non-empty.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
