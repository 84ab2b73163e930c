//! Recipe workspace endpoints.
//!
//! Each handler operates on the caller's in-memory draft and answers with the
//! resulting [`WorkspaceSnapshot`] so the client can re-render.

use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use mealmind_core::{IngredientImage, RecipeId};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::models::Recipe;
use crate::services::WorkspaceSnapshot;
use crate::state::AppState;

/// Multipart field carrying the photo.
const IMAGE_FIELD: &str = "image";

#[derive(Debug, Deserialize)]
pub struct SetImageRequest {
    /// Image as a `data:` URL.
    pub image: String,
}

#[derive(Debug, Deserialize)]
pub struct SetInstructionsRequest {
    #[serde(default)]
    pub instructions: String,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    /// The saved recipe, or `null` when there was nothing to save.
    pub recipe: Option<Recipe>,
    pub workspace: WorkspaceSnapshot,
}

/// GET /api/workspace
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Json<WorkspaceSnapshot> {
    Json(state.workspaces().get(user.id).await.snapshot().await)
}

/// PUT /api/workspace/image
///
/// # Errors
///
/// Returns `AppError::Image` if the data URL is not an accepted image.
pub async fn set_image(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(request): Json<SetImageRequest>,
) -> Result<Json<WorkspaceSnapshot>> {
    let image = IngredientImage::parse(&request.image)?;
    let workspace = state.workspaces().get(user.id).await;
    workspace.lock().await.set_image(image);
    Ok(Json(workspace.snapshot().await))
}

/// POST /api/workspace/image/upload
///
/// Accepts a multipart form with an `image` file field.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the form has no image field, or
/// `AppError::Image` if the file is not an accepted image.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn upload_image(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    mut multipart: Multipart,
) -> Result<Json<WorkspaceSnapshot>> {
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid upload: {e}")))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid upload: {e}")))?;
        debug!(size = bytes.len(), content_type = ?content_type, "Received image upload");
        image = Some(IngredientImage::from_bytes(content_type.as_deref(), &bytes)?);
        break;
    }

    let image = image.ok_or_else(|| AppError::BadRequest("No image uploaded".to_string()))?;
    let workspace = state.workspaces().get(user.id).await;
    workspace.lock().await.set_image(image);
    Ok(Json(workspace.snapshot().await))
}

/// DELETE /api/workspace/image
pub async fn clear_image(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Json<WorkspaceSnapshot> {
    let workspace = state.workspaces().get(user.id).await;
    workspace.lock().await.clear_image();
    Json(workspace.snapshot().await)
}

/// PUT /api/workspace/instructions
pub async fn set_instructions(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(request): Json<SetInstructionsRequest>,
) -> Json<WorkspaceSnapshot> {
    let workspace = state.workspaces().get(user.id).await;
    workspace.lock().await.set_instructions(request.instructions);
    Json(workspace.snapshot().await)
}

/// POST /api/workspace/generate
///
/// # Errors
///
/// Returns 400 without an image, 409 while another generation runs, 402 when
/// the free limit is used up, or a generation error.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn generate(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<WorkspaceSnapshot>> {
    let workspace = state.workspaces().get(user.id).await;
    state
        .workspace_service()
        .generate(user.id, &workspace, Utc::now().weekday())
        .await?;

    add_breadcrumb("workspace", "Recipe generated", None);
    Ok(Json(workspace.snapshot().await))
}

/// POST /api/workspace/save
///
/// # Errors
///
/// Returns `AppError::Database` if the recipe cannot be stored.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn save(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<SaveResponse>> {
    let workspace = state.workspaces().get(user.id).await;
    let recipe = state.workspace_service().save(user.id, &workspace).await?;
    Ok(Json(SaveResponse {
        recipe,
        workspace: workspace.snapshot().await,
    }))
}

/// POST /api/workspace/edit/{id}
///
/// # Errors
///
/// Returns `AppError::NotFound` if the user has no such recipe.
pub async fn edit(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<RecipeId>,
) -> Result<Json<WorkspaceSnapshot>> {
    let workspace = state.workspaces().get(user.id).await;
    state
        .workspace_service()
        .edit(user.id, id, &workspace)
        .await?;
    Ok(Json(workspace.snapshot().await))
}

/// DELETE /api/workspace
pub async fn discard(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Json<WorkspaceSnapshot> {
    let workspace = state.workspaces().get(user.id).await;
    workspace.lock().await.discard();
    Json(workspace.snapshot().await)
}
