//! Database operations for MealMind `PostgreSQL`.
//!
//! The database is the Supabase project's Postgres. Every table is keyed by
//! the identity provider's user id.
//!
//! ## Tables
//!
//! - `recipes` - Saved recipes (text plus optional ingredient photo)
//! - `pantry_items` - Pantry inventory
//! - `profiles` - Cooking preferences, one row per user
//! - `subscriptions` - PayPal subscription records
//! - `recipe_generations` - Per-user generation counter
//!
//! # Migrations
//!
//! Migrations for local development are stored in `crates/server/migrations/`
//! and run via:
//! ```bash
//! cargo run -p mealmind-cli -- migrate
//! ```

pub mod pantry;
pub mod profiles;
pub mod recipes;
pub mod subscriptions;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::store::DataStore;

pub use pantry::PantryRepository;
pub use profiles::ProfileRepository;
pub use recipes::RecipeRepository;
pub use subscriptions::SubscriptionRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate subscription id).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Postgres-backed implementation of every store trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DataStore for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Convert a non-negative database integer, reporting corruption otherwise.
pub(crate) fn to_u32(value: i32, what: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative {what} in database: {value}")))
}
