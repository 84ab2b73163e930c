//! Recipe repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mealmind_core::{RecipeId, UserId};

use super::{PgStore, RepositoryError};
use crate::models::Recipe;
use crate::store::RecipeStore;

#[derive(sqlx::FromRow)]
struct RecipeRow {
    id: RecipeId,
    user_id: UserId,
    recipe_text: String,
    ingredients_image: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<RecipeRow> for Recipe {
    fn from(row: RecipeRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            recipe_text: row.recipe_text,
            ingredients_image: row.ingredients_image,
            created_at: row.created_at,
        }
    }
}

/// Repository for saved recipes.
pub struct RecipeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RecipeRepository<'a> {
    /// Create a new recipe repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's recipes, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Recipe>, RepositoryError> {
        let rows = sqlx::query_as::<_, RecipeRow>(
            r"
            SELECT id, user_id, recipe_text, ingredients_image, created_at
            FROM recipes
            WHERE user_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    /// Get one of a user's recipes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId, id: RecipeId) -> Result<Option<Recipe>, RepositoryError> {
        let row = sqlx::query_as::<_, RecipeRow>(
            r"
            SELECT id, user_id, recipe_text, ingredients_image, created_at
            FROM recipes
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Recipe::from))
    }

    /// Insert a recipe.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        recipe_text: &str,
        ingredients_image: Option<&str>,
    ) -> Result<Recipe, RepositoryError> {
        let row = sqlx::query_as::<_, RecipeRow>(
            r"
            INSERT INTO recipes (user_id, recipe_text, ingredients_image)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, recipe_text, ingredients_image, created_at
            ",
        )
        .bind(user_id)
        .bind(recipe_text)
        .bind(ingredients_image)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Delete one of a user's recipes. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, user_id: UserId, id: RecipeId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RecipeStore for PgStore {
    async fn list_recipes(&self, user_id: UserId) -> Result<Vec<Recipe>, RepositoryError> {
        RecipeRepository::new(self.pool()).list(user_id).await
    }

    async fn get_recipe(
        &self,
        user_id: UserId,
        id: RecipeId,
    ) -> Result<Option<Recipe>, RepositoryError> {
        RecipeRepository::new(self.pool()).get(user_id, id).await
    }

    async fn insert_recipe(
        &self,
        user_id: UserId,
        recipe_text: &str,
        ingredients_image: Option<&str>,
    ) -> Result<Recipe, RepositoryError> {
        RecipeRepository::new(self.pool())
            .create(user_id, recipe_text, ingredients_image)
            .await
    }

    async fn delete_recipe(&self, user_id: UserId, id: RecipeId) -> Result<bool, RepositoryError> {
        RecipeRepository::new(self.pool()).delete(user_id, id).await
    }
}
