//! Free-tier generation limit.

use mealmind_core::UserId;

use crate::db::RepositoryError;
use crate::models::UsageSummary;
use crate::store::SubscriptionStore;

/// Compares a user's generation count against the free-tier limit.
pub struct Paywall<'a, S: SubscriptionStore + ?Sized> {
    store: &'a S,
    free_limit: u32,
}

impl<'a, S: SubscriptionStore + ?Sized> Paywall<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, free_limit: u32) -> Self {
        Self { store, free_limit }
    }

    /// Current subscription and usage for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the subscription or counter cannot be read.
    pub async fn usage(&self, user_id: UserId) -> Result<UsageSummary, RepositoryError> {
        let subscription = self.store.get_subscription(user_id).await?;
        let count = self.store.generation_count(user_id).await?;
        Ok(UsageSummary::new(subscription, count, self.free_limit))
    }

    /// Whether `user_id` may run another generation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the subscription or counter cannot be read.
    pub async fn can_generate(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        Ok(!self.usage(user_id).await?.paywalled)
    }
}
