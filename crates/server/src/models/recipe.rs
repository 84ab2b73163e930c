//! Saved recipe domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mealmind_core::{RecipeId, UserId};

/// A recipe the user saved from their workspace.
///
/// Created on save, never updated, deleted on request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub user_id: UserId,
    /// Generated text, with any additional instructions appended.
    pub recipe_text: String,
    /// Ingredient photo as a data URL.
    pub ingredients_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Recipe {
    /// Display title derived from the recipe text.
    #[must_use]
    pub fn title(&self) -> String {
        mealmind_core::recipe::title(&self.recipe_text)
    }
}
