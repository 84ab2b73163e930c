//! Profile (cooking preferences) repository.
//!
//! The `profiles` row id is the user id.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

use mealmind_core::{Preferences, SkillLevel, TimePreferences, UserId};

use super::{PgStore, RepositoryError};
use crate::store::ProfileStore;

#[derive(sqlx::FromRow)]
struct ProfileRow {
    cooking_skill_level: Option<String>,
    dietary_preferences: Option<Vec<String>>,
    available_equipment: Option<Vec<String>>,
    cuisine_preferences: Option<Vec<String>>,
    time_preferences: Option<serde_json::Value>,
}

impl TryFrom<ProfileRow> for Preferences {
    type Error = RepositoryError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let skill_level = row
            .cooking_skill_level
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<SkillLevel>())
            .transpose()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            skill_level,
            dietary: row.dietary_preferences.unwrap_or_default(),
            equipment: row.available_equipment.unwrap_or_default(),
            cuisines: row.cuisine_preferences.unwrap_or_default(),
            time: TimePreferences::from_json(row.time_preferences.as_ref()),
        })
    }
}

/// Repository for profile preferences.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load a user's preferences.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored skill level is unknown.
    pub async fn get(&self, user_id: UserId) -> Result<Option<Preferences>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            SELECT cooking_skill_level, dietary_preferences, available_equipment,
                   cuisine_preferences, time_preferences
            FROM profiles
            WHERE id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Preferences::try_from).transpose()
    }

    /// Insert or replace a user's preferences.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert(
        &self,
        user_id: UserId,
        preferences: &Preferences,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO profiles (
                id, cooking_skill_level, dietary_preferences, available_equipment,
                cuisine_preferences, time_preferences, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, now())
            ON CONFLICT (id) DO UPDATE SET
                cooking_skill_level = EXCLUDED.cooking_skill_level,
                dietary_preferences = EXCLUDED.dietary_preferences,
                available_equipment = EXCLUDED.available_equipment,
                cuisine_preferences = EXCLUDED.cuisine_preferences,
                time_preferences = EXCLUDED.time_preferences,
                updated_at = now()
            ",
        )
        .bind(user_id)
        .bind(preferences.skill_level.map(|s| s.to_string()))
        .bind(&preferences.dietary)
        .bind(&preferences.equipment)
        .bind(&preferences.cuisines)
        .bind(Json(preferences.time))
        .execute(self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn get_preferences(
        &self,
        user_id: UserId,
    ) -> Result<Option<Preferences>, RepositoryError> {
        ProfileRepository::new(self.pool()).get(user_id).await
    }

    async fn upsert_preferences(
        &self,
        user_id: UserId,
        preferences: &Preferences,
    ) -> Result<(), RepositoryError> {
        ProfileRepository::new(self.pool())
            .upsert(user_id, preferences)
            .await
    }
}
