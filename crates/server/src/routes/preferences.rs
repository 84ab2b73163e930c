//! Cooking preference endpoints.

use axum::{Json, extract::State};
use tracing::{info, instrument};

use mealmind_core::Preferences;

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::state::AppState;

/// GET /api/preferences
///
/// Users who never saved preferences get the defaults.
///
/// # Errors
///
/// Returns `AppError::Database` if the profile cannot be loaded.
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Preferences>> {
    let preferences = state
        .store()
        .get_preferences(user.id)
        .await?
        .unwrap_or_default();
    Ok(Json(preferences))
}

/// PUT /api/preferences
///
/// Replaces the stored preferences and returns them as saved.
///
/// # Errors
///
/// Returns `AppError::Database` if the profile cannot be written.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(preferences): Json<Preferences>,
) -> Result<Json<Preferences>> {
    let preferences = preferences.normalized();
    state
        .store()
        .upsert_preferences(user.id, &preferences)
        .await?;
    info!("Preferences saved");
    Ok(Json(preferences))
}
