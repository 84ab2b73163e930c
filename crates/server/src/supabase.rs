//! Supabase GoTrue client for access-token validation.
//!
//! Tokens are validated by asking the project's auth server for the token's
//! user (`GET /auth/v1/user`). Accepted tokens are cached briefly so a burst
//! of API calls from one page does not hit the auth server for each request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use mealmind_core::UserId;

use crate::config::SupabaseConfig;
use crate::identity::{AuthenticatedUser, IdentityError, IdentityProvider};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const TOKEN_CACHE_TTL: Duration = Duration::from_secs(60);
const TOKEN_CACHE_CAPACITY: u64 = 10_000;

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    email: Option<String>,
}

/// Supabase auth client.
#[derive(Clone)]
pub struct SupabaseAuthClient {
    inner: Arc<SupabaseAuthClientInner>,
}

struct SupabaseAuthClientInner {
    client: reqwest::Client,
    user_url: String,
    tokens: Cache<String, AuthenticatedUser>,
}

impl SupabaseAuthClient {
    /// Create a new auth client.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Parse` if the anon key is not a valid header
    /// value, or `IdentityError::Http` if the HTTP client cannot be built.
    pub fn new(config: &SupabaseConfig) -> Result<Self, IdentityError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&config.anon_key)
                .map_err(|e| IdentityError::Parse(format!("invalid anon key: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let tokens = Cache::builder()
            .max_capacity(TOKEN_CACHE_CAPACITY)
            .time_to_live(TOKEN_CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(SupabaseAuthClientInner {
                client,
                user_url: format!("{}/auth/v1/user", config.url),
                tokens,
            }),
        })
    }

    #[instrument(skip_all)]
    async fn fetch_user(&self, access_token: &str) -> Result<AuthenticatedUser, IdentityError> {
        let bearer = HeaderValue::from_str(&format!("Bearer {access_token}"))
            .map_err(|_| IdentityError::InvalidToken)?;

        let response = self
            .inner
            .client
            .get(&self.inner.user_url)
            .header(AUTHORIZATION, bearer)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            debug!(status = %status, "Access token rejected");
            return Err(IdentityError::InvalidToken);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = %status, "Supabase auth error");
            return Err(IdentityError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let user: GoTrueUser = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(format!("Failed to parse user: {e}")))?;
        let id = user
            .id
            .parse::<UserId>()
            .map_err(|e| IdentityError::Parse(format!("invalid user id: {e}")))?;

        Ok(AuthenticatedUser {
            id,
            email: user.email,
        })
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuthClient {
    async fn authenticate(&self, access_token: &str) -> Result<AuthenticatedUser, IdentityError> {
        if let Some(user) = self.inner.tokens.get(access_token).await {
            return Ok(user);
        }

        let user = self.fetch_user(access_token).await?;
        self.inner
            .tokens
            .insert(access_token.to_owned(), user.clone())
            .await;
        Ok(user)
    }
}
