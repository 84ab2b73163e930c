//! Persistence interfaces.
//!
//! Handlers talk to storage through these traits so the backing store can be
//! swapped for an in-memory fake in tests. [`crate::db::PgStore`] implements
//! all of them against Postgres.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use mealmind_core::{PantryItemId, Preferences, RecipeId, SubscriptionStatus, UserId};

use crate::db::RepositoryError;
use crate::models::{NewPantryItem, PantryItem, Recipe, Subscription};

/// Saved recipes.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// All of a user's recipes, newest first.
    async fn list_recipes(&self, user_id: UserId) -> Result<Vec<Recipe>, RepositoryError>;

    async fn get_recipe(
        &self,
        user_id: UserId,
        id: RecipeId,
    ) -> Result<Option<Recipe>, RepositoryError>;

    async fn insert_recipe(
        &self,
        user_id: UserId,
        recipe_text: &str,
        ingredients_image: Option<&str>,
    ) -> Result<Recipe, RepositoryError>;

    /// Returns `false` when no such recipe belongs to the user.
    async fn delete_recipe(&self, user_id: UserId, id: RecipeId) -> Result<bool, RepositoryError>;
}

/// Pantry inventory.
#[async_trait]
pub trait PantryStore: Send + Sync {
    /// All of a user's pantry items, newest first.
    async fn list_pantry_items(&self, user_id: UserId) -> Result<Vec<PantryItem>, RepositoryError>;

    /// Insert an already-normalized item.
    async fn add_pantry_item(
        &self,
        user_id: UserId,
        item: &NewPantryItem,
    ) -> Result<PantryItem, RepositoryError>;

    /// Delete the given items; ids not owned by the user are ignored.
    /// Returns the number of rows removed.
    async fn delete_pantry_items(
        &self,
        user_id: UserId,
        ids: &[PantryItemId],
    ) -> Result<u64, RepositoryError>;
}

/// Profile preferences.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_preferences(&self, user_id: UserId)
    -> Result<Option<Preferences>, RepositoryError>;

    /// Replace the stored preferences wholesale.
    async fn upsert_preferences(
        &self,
        user_id: UserId,
        preferences: &Preferences,
    ) -> Result<(), RepositoryError>;
}

/// Subscriptions and the per-user generation counter.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn get_subscription(
        &self,
        user_id: UserId,
    ) -> Result<Option<Subscription>, RepositoryError>;

    /// Record a subscription the user approved at checkout, as `pending`.
    async fn record_pending_subscription(
        &self,
        user_id: UserId,
        paypal_subscription_id: &str,
    ) -> Result<Subscription, RepositoryError>;

    /// Set the status of the subscription with the given provider id.
    ///
    /// `current_period_end` replaces the stored value only when present.
    /// Returns the number of rows updated.
    async fn update_subscription_status(
        &self,
        paypal_subscription_id: &str,
        status: SubscriptionStatus,
        current_period_end: Option<DateTime<Utc>>,
    ) -> Result<u64, RepositoryError>;

    /// Successful generations so far (zero when never counted).
    async fn generation_count(&self, user_id: UserId) -> Result<u32, RepositoryError>;

    /// Add one to the counter, returning the new value.
    async fn increment_generation_count(&self, user_id: UserId) -> Result<u32, RepositoryError>;
}

/// Everything the HTTP layer needs from storage.
#[async_trait]
pub trait DataStore: RecipeStore + PantryStore + ProfileStore + SubscriptionStore {
    /// Check the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
