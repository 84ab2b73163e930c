//! Saved recipe endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use mealmind_core::{Block, RecipeId, UserId, format_recipe};

use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::Recipe;
use crate::state::AppState;

/// A saved recipe in list responses.
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub title: String,
}

impl From<Recipe> for RecipeSummary {
    fn from(recipe: Recipe) -> Self {
        Self {
            title: recipe.title(),
            recipe,
        }
    }
}

/// A saved recipe with its text formatted for display.
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub title: String,
    pub blocks: Vec<Block>,
}

impl From<Recipe> for RecipeDetail {
    fn from(recipe: Recipe) -> Self {
        Self {
            title: recipe.title(),
            blocks: format_recipe(&recipe.recipe_text),
            recipe,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FormatRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct FormatResponse {
    pub blocks: Vec<Block>,
}

/// GET /api/recipes
///
/// # Errors
///
/// Returns `AppError::Database` if the recipes cannot be loaded.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<RecipeSummary>>> {
    let recipes = state.store().list_recipes(user.id).await?;
    Ok(Json(recipes.into_iter().map(RecipeSummary::from).collect()))
}

/// GET /api/recipes/{id}
///
/// # Errors
///
/// Returns `AppError::NotFound` if the user has no such recipe.
#[instrument(skip_all, fields(user_id = %user.id, recipe_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<RecipeId>,
) -> Result<Json<RecipeDetail>> {
    let recipe = find_recipe(&state, user.id, id).await?;
    Ok(Json(recipe.into()))
}

/// DELETE /api/recipes/{id}
///
/// # Errors
///
/// Returns `AppError::NotFound` if the user has no such recipe.
#[instrument(skip_all, fields(user_id = %user.id, recipe_id = %id))]
pub async fn destroy(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<RecipeId>,
) -> Result<StatusCode> {
    if state.store().delete_recipe(user.id, id).await? {
        info!("Recipe deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Recipe not found".to_string()))
    }
}

/// POST /api/recipes/format
///
/// Formats arbitrary recipe text into display blocks.
pub async fn format(
    RequireUser(_user): RequireUser,
    Json(request): Json<FormatRequest>,
) -> Json<FormatResponse> {
    Json(FormatResponse {
        blocks: format_recipe(&request.text),
    })
}

/// Load one of the user's recipes or fail with 404.
pub(crate) async fn find_recipe(
    state: &AppState,
    user_id: UserId,
    id: RecipeId,
) -> Result<Recipe> {
    state
        .store()
        .get_recipe(user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe not found".to_string()))
}
