//! Pantry inventory endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use mealmind_core::PantryItemId;

use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::{NewPantryItem, PantryItem};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DeletePantryItemsRequest {
    #[serde(default)]
    pub ids: Vec<PantryItemId>,
}

#[derive(Debug, Serialize)]
pub struct DeletePantryItemsResponse {
    pub deleted: u64,
}

/// GET /api/pantry
///
/// # Errors
///
/// Returns `AppError::Database` if the items cannot be loaded.
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<PantryItem>>> {
    Ok(Json(state.store().list_pantry_items(user.id).await?))
}

/// POST /api/pantry
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the name is blank.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(item): Json<NewPantryItem>,
) -> Result<(StatusCode, Json<PantryItem>)> {
    let item = item
        .normalized()
        .ok_or_else(|| AppError::BadRequest("Item name is required".to_string()))?;

    let created = state.store().add_pantry_item(user.id, &item).await?;
    info!(item_id = %created.id, "Pantry item added");
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/pantry/delete
///
/// Ids that do not belong to the user are ignored.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if no ids are given.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn delete_selected(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(request): Json<DeletePantryItemsRequest>,
) -> Result<Json<DeletePantryItemsResponse>> {
    if request.ids.is_empty() {
        return Err(AppError::BadRequest(
            "Select at least one item to delete".to_string(),
        ));
    }

    let deleted = state
        .store()
        .delete_pantry_items(user.id, &request.ids)
        .await?;
    info!(deleted, "Pantry items deleted");
    Ok(Json(DeletePantryItemsResponse { deleted }))
}
