//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                      - Liveness
//! GET    /health/ready                - Readiness (data store ping)
//! GET    /api/config                  - Public client config
//!
//! # Saved recipes (requires auth)
//! GET    /api/recipes                 - List, newest first
//! GET    /api/recipes/{id}            - One recipe with formatted blocks
//! DELETE /api/recipes/{id}            - Delete
//! POST   /api/recipes/format          - Format arbitrary text
//!
//! # Workspace (requires auth)
//! GET    /api/workspace               - Current draft
//! DELETE /api/workspace               - Discard draft
//! PUT    /api/workspace/image         - Set image (data URL)
//! DELETE /api/workspace/image         - Remove image
//! POST   /api/workspace/image/upload  - Set image (multipart)
//! PUT    /api/workspace/instructions  - Set additional instructions
//! POST   /api/workspace/generate      - Generate a recipe
//! POST   /api/workspace/save          - Save the draft
//! POST   /api/workspace/edit/{id}     - Load a saved recipe
//!
//! # Pantry, preferences, subscription (requires auth)
//! GET    /api/pantry                  - List items
//! POST   /api/pantry                  - Add item
//! POST   /api/pantry/delete           - Delete selected items
//! GET    /api/preferences             - Load preferences
//! PUT    /api/preferences             - Save preferences
//! GET    /api/subscription            - Subscription and usage
//! POST   /api/subscription            - Record approved subscription
//!
//! # Webhooks (no auth)
//! POST   /api/webhooks/paypal         - PayPal subscription events
//!
//! # Pages (requires auth)
//! GET    /recipes/{id}                - Printable recipe
//! ```

pub mod client_config;
pub mod health;
pub mod pages;
pub mod pantry;
pub mod preferences;
pub mod recipes;
pub mod subscription;
pub mod webhooks;
pub mod workspace;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use mealmind_core::IngredientImage;

use crate::middleware::{api_rate_limiter, generation_rate_limiter};
use crate::state::AppState;

/// Whether per-IP rate limits are applied.
///
/// Limits key on proxy headers, so they are disabled where no proxy sets
/// them (tests, local development).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimiting {
    Enabled,
    Disabled,
}

/// Body limit for image routes: the raw image limit plus base64 and form overhead.
pub const IMAGE_BODY_LIMIT: usize = IngredientImage::MAX_BYTES / 3 * 4 + 64 * 1024;

/// Create the saved recipe routes router.
pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(recipes::index))
        .route("/format", post(recipes::format))
        .route("/{id}", get(recipes::show).delete(recipes::destroy))
}

/// Create the workspace routes router.
pub fn workspace_routes(rate_limiting: RateLimiting) -> Router<AppState> {
    let image_routes = Router::new()
        .route(
            "/image",
            put(workspace::set_image).delete(workspace::clear_image),
        )
        .route("/image/upload", post(workspace::upload_image))
        .layer(DefaultBodyLimit::max(IMAGE_BODY_LIMIT));

    Router::new()
        .route("/", get(workspace::show).delete(workspace::discard))
        .route("/instructions", put(workspace::set_instructions))
        .route("/save", post(workspace::save))
        .route("/edit/{id}", post(workspace::edit))
        .merge(image_routes)
        .merge(generate_route(rate_limiting))
}

fn generate_route(rate_limiting: RateLimiting) -> Router<AppState> {
    let router = Router::new().route("/generate", post(workspace::generate));
    match rate_limiting {
        RateLimiting::Enabled => router.layer(generation_rate_limiter()),
        RateLimiting::Disabled => router,
    }
}

/// Create the pantry routes router.
pub fn pantry_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pantry::index).post(pantry::create))
        .route("/delete", post(pantry::delete_selected))
}

/// Create the JSON API router (mounted at `/api`).
///
/// Webhooks are merged after the general limiter so PayPal retries are never
/// throttled.
pub fn api_routes(rate_limiting: RateLimiting) -> Router<AppState> {
    let api = Router::new()
        .route("/config", get(client_config::show))
        .nest("/recipes", recipe_routes())
        .nest("/workspace", workspace_routes(rate_limiting))
        .nest("/pantry", pantry_routes())
        .route(
            "/preferences",
            get(preferences::show).put(preferences::update),
        )
        .route(
            "/subscription",
            get(subscription::show).post(subscription::approve),
        );

    let api = match rate_limiting {
        RateLimiting::Enabled => api.layer(api_rate_limiter()),
        RateLimiting::Disabled => api,
    };

    api.nest("/webhooks", webhooks::routes())
}

/// Create all routes.
pub fn routes(rate_limiting: RateLimiting) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes(rate_limiting))
        .route("/recipes/{id}", get(pages::recipe))
}

