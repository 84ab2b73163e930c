//! Subscription and generation-counter repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mealmind_core::{SubscriptionId, SubscriptionStatus, UserId};

use super::{PgStore, RepositoryError, to_u32};
use crate::models::Subscription;
use crate::models::subscription::PAYPAL_PROVIDER;
use crate::store::SubscriptionStore;

#[derive(sqlx::FromRow)]
struct SubscriptionRow {
    id: SubscriptionId,
    user_id: UserId,
    status: String,
    payment_provider: Option<String>,
    paypal_subscription_id: Option<String>,
    current_period_end: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = RepositoryError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<SubscriptionStatus>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            status,
            payment_provider: row
                .payment_provider
                .unwrap_or_else(|| PAYPAL_PROVIDER.to_owned()),
            paypal_subscription_id: row.paypal_subscription_id,
            current_period_end: row.current_period_end,
            created_at: row.created_at,
        })
    }
}

/// Repository for subscriptions and generation counts.
pub struct SubscriptionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SubscriptionRepository<'a> {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's subscription.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored status is unknown.
    pub async fn get_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Subscription>, RepositoryError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r"
            SELECT id, user_id, status, payment_provider, paypal_subscription_id,
                   current_period_end, created_at
            FROM subscriptions
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Subscription::try_from).transpose()
    }

    /// Record an approved PayPal subscription as pending.
    ///
    /// A user has at most one subscription row; approving again replaces the
    /// provider id and resets the status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the provider id is already
    /// recorded for another user.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn upsert_pending(
        &self,
        user_id: UserId,
        paypal_subscription_id: &str,
    ) -> Result<Subscription, RepositoryError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r"
            INSERT INTO subscriptions (user_id, status, payment_provider, paypal_subscription_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE SET
                status = EXCLUDED.status,
                payment_provider = EXCLUDED.payment_provider,
                paypal_subscription_id = EXCLUDED.paypal_subscription_id,
                current_period_end = NULL,
                updated_at = now()
            RETURNING id, user_id, status, payment_provider, paypal_subscription_id,
                      current_period_end, created_at
            ",
        )
        .bind(user_id)
        .bind(SubscriptionStatus::Pending.to_string())
        .bind(PAYPAL_PROVIDER)
        .bind(paypal_subscription_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return RepositoryError::Conflict(
                        "subscription id already recorded".to_owned(),
                    );
                }
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }

    /// Update status by PayPal subscription id. Returns rows updated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_status(
        &self,
        paypal_subscription_id: &str,
        status: SubscriptionStatus,
        current_period_end: Option<DateTime<Utc>>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE subscriptions
            SET status = $2,
                current_period_end = COALESCE($3, current_period_end),
                updated_at = now()
            WHERE paypal_subscription_id = $1
            ",
        )
        .bind(paypal_subscription_id)
        .bind(status.to_string())
        .bind(current_period_end)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Current generation count for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn generation_count(&self, user_id: UserId) -> Result<u32, RepositoryError> {
        let count = sqlx::query_scalar::<_, Option<i32>>(
            "SELECT count FROM recipe_generations WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .flatten()
        .unwrap_or(0);

        to_u32(count, "generation count")
    }

    /// Increment the generation count, creating the row on first use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn increment_generation_count(
        &self,
        user_id: UserId,
    ) -> Result<u32, RepositoryError> {
        let count = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO recipe_generations (user_id, count)
            VALUES ($1, 1)
            ON CONFLICT (user_id) DO UPDATE SET
                count = COALESCE(recipe_generations.count, 0) + 1,
                updated_at = now()
            RETURNING count
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        to_u32(count, "generation count")
    }
}

#[async_trait]
impl SubscriptionStore for PgStore {
    async fn get_subscription(
        &self,
        user_id: UserId,
    ) -> Result<Option<Subscription>, RepositoryError> {
        SubscriptionRepository::new(self.pool())
            .get_by_user(user_id)
            .await
    }

    async fn record_pending_subscription(
        &self,
        user_id: UserId,
        paypal_subscription_id: &str,
    ) -> Result<Subscription, RepositoryError> {
        SubscriptionRepository::new(self.pool())
            .upsert_pending(user_id, paypal_subscription_id)
            .await
    }

    async fn update_subscription_status(
        &self,
        paypal_subscription_id: &str,
        status: SubscriptionStatus,
        current_period_end: Option<DateTime<Utc>>,
    ) -> Result<u64, RepositoryError> {
        SubscriptionRepository::new(self.pool())
            .update_status(paypal_subscription_id, status, current_period_end)
            .await
    }

    async fn generation_count(&self, user_id: UserId) -> Result<u32, RepositoryError> {
        SubscriptionRepository::new(self.pool())
            .generation_count(user_id)
            .await
    }

    async fn increment_generation_count(&self, user_id: UserId) -> Result<u32, RepositoryError> {
        SubscriptionRepository::new(self.pool())
            .increment_generation_count(user_id)
            .await
    }
}
