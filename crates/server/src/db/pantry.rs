//! Pantry repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use mealmind_core::{PantryItemId, UserId};

use super::{PgStore, RepositoryError};
use crate::models::{NewPantryItem, PantryItem};
use crate::store::PantryStore;

#[derive(sqlx::FromRow)]
struct PantryItemRow {
    id: PantryItemId,
    user_id: UserId,
    name: String,
    quantity: Option<i32>,
    unit: Option<String>,
    expiry_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl From<PantryItemRow> for PantryItem {
    fn from(row: PantryItemRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            quantity: row.quantity.unwrap_or(NewPantryItem::DEFAULT_QUANTITY),
            unit: row.unit,
            expiry_date: row.expiry_date,
            created_at: row.created_at,
        }
    }
}

/// Repository for pantry items.
pub struct PantryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PantryRepository<'a> {
    /// Create a new pantry repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's pantry, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<PantryItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, PantryItemRow>(
            r"
            SELECT id, user_id, name, quantity, unit, expiry_date, created_at
            FROM pantry_items
            WHERE user_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(PantryItem::from).collect())
    }

    /// Insert a pantry item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        item: &NewPantryItem,
    ) -> Result<PantryItem, RepositoryError> {
        let row = sqlx::query_as::<_, PantryItemRow>(
            r"
            INSERT INTO pantry_items (user_id, name, quantity, unit, expiry_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, name, quantity, unit, expiry_date, created_at
            ",
        )
        .bind(user_id)
        .bind(&item.name)
        .bind(item.quantity_or_default())
        .bind(item.unit.as_deref())
        .bind(item.expiry_date)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Delete a set of a user's pantry items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_many(
        &self,
        user_id: UserId,
        ids: &[PantryItemId],
    ) -> Result<u64, RepositoryError> {
        let ids: Vec<Uuid> = ids.iter().map(PantryItemId::as_uuid).collect();
        let result = sqlx::query("DELETE FROM pantry_items WHERE user_id = $1 AND id = ANY($2)")
            .bind(user_id)
            .bind(ids)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl PantryStore for PgStore {
    async fn list_pantry_items(&self, user_id: UserId) -> Result<Vec<PantryItem>, RepositoryError> {
        PantryRepository::new(self.pool()).list(user_id).await
    }

    async fn add_pantry_item(
        &self,
        user_id: UserId,
        item: &NewPantryItem,
    ) -> Result<PantryItem, RepositoryError> {
        PantryRepository::new(self.pool()).create(user_id, item).await
    }

    async fn delete_pantry_items(
        &self,
        user_id: UserId,
        ids: &[PantryItemId],
    ) -> Result<u64, RepositoryError> {
        PantryRepository::new(self.pool())
            .delete_many(user_id, ids)
            .await
    }
}
