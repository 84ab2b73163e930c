//! Per-user recipe workspace.
//!
//! The workspace holds the draft a user is working on between requests: the
//! ingredient photo, the generated recipe text, extra instructions, and which
//! view the client should show. Drafts live only in memory and expire after an
//! hour without access.

mod error;

pub use error::WorkspaceError;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Weekday;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

use mealmind_core::{Block, IngredientImage, RecipeId, UserId, format_recipe, recipe};

use crate::generator::{GenerationRequest, RecipeGenerator};
use crate::models::Recipe;
use crate::services::Paywall;
use crate::store::DataStore;

/// How long an untouched draft is kept.
const IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Maximum number of drafts held at once.
const MAX_WORKSPACES: u64 = 10_000;

/// Which part of the recipe screen the client should show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Upload,
    Recipe,
    Saved,
}

/// Draft state for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeWorkspace {
    image: Option<IngredientImage>,
    draft: Option<String>,
    instructions: String,
    view: View,
}

impl RecipeWorkspace {
    #[must_use]
    pub const fn image(&self) -> Option<&IngredientImage> {
        self.image.as_ref()
    }

    #[must_use]
    pub fn draft(&self) -> Option<&str> {
        self.draft.as_deref()
    }

    #[must_use]
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    #[must_use]
    pub const fn view(&self) -> View {
        self.view
    }

    pub fn set_image(&mut self, image: IngredientImage) {
        self.image = Some(image);
    }

    pub fn clear_image(&mut self) {
        self.image = None;
    }

    pub fn set_instructions(&mut self, instructions: impl Into<String>) {
        self.instructions = instructions.into();
    }

    /// Store freshly generated text and switch to the recipe view.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = Some(text.into());
        self.view = View::Recipe;
    }

    /// Drop the draft, image and instructions.
    pub fn discard(&mut self) {
        *self = Self::default();
    }

    /// Load saved recipe text for editing.
    ///
    /// Text after the instructions marker goes back into the instructions
    /// field. An image that no longer parses is dropped.
    pub fn load(&mut self, recipe: &Recipe) {
        let (draft, instructions) = recipe::split(&recipe.recipe_text);
        self.draft = Some(draft.to_owned());
        self.instructions = instructions.to_owned();
        self.image = recipe
            .ingredients_image
            .as_deref()
            .and_then(|url| IngredientImage::parse(url).ok());
        self.view = View::Upload;
    }

    /// Text and image to persist, or `None` when there is nothing to save.
    #[must_use]
    pub fn pending_save(&self) -> Option<(String, String)> {
        let draft = self.draft.as_deref()?;
        let image = self.image.as_ref()?;
        Some((
            recipe::compose(draft, &self.instructions),
            image.to_data_url(),
        ))
    }

    /// Instructions to send with a generation, if any.
    fn generation_instructions(&self) -> Option<String> {
        let trimmed = self.instructions.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    }
}

/// Serializable view of a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceSnapshot {
    pub view: View,
    /// Image as a data URL.
    pub image: Option<String>,
    pub draft: Option<String>,
    pub instructions: String,
    /// Draft formatted for display.
    pub blocks: Vec<Block>,
    pub generating: bool,
}

/// A user's workspace plus its generation flag.
///
/// The flag lives outside the mutex so readers are not blocked while a
/// generation is running.
#[derive(Debug, Default)]
pub struct Workspace {
    state: Mutex<RecipeWorkspace>,
    generating: AtomicBool,
}

impl Workspace {
    pub async fn lock(&self) -> MutexGuard<'_, RecipeWorkspace> {
        self.state.lock().await
    }

    #[must_use]
    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire)
    }

    /// Claim the generation slot, or `None` if one is already running.
    fn begin_generation(&self) -> Option<GenerationGuard<'_>> {
        self.generating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GenerationGuard(&self.generating))
    }

    pub async fn snapshot(&self) -> WorkspaceSnapshot {
        let state = self.lock().await;
        WorkspaceSnapshot {
            view: state.view,
            image: state.image.as_ref().map(IngredientImage::to_data_url),
            draft: state.draft.clone(),
            instructions: state.instructions.clone(),
            blocks: state.draft.as_deref().map(format_recipe).unwrap_or_default(),
            generating: self.is_generating(),
        }
    }
}

/// Releases the generation slot on drop, including when the request is
/// cancelled mid-flight.
struct GenerationGuard<'a>(&'a AtomicBool);

impl Drop for GenerationGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// All live workspaces, keyed by user.
#[derive(Clone)]
pub struct Workspaces {
    cache: Cache<UserId, Arc<Workspace>>,
}

impl Workspaces {
    #[must_use]
    pub fn new(max_capacity: u64, time_to_idle: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_idle(time_to_idle)
                .build(),
        }
    }

    /// The user's workspace, created empty on first access.
    pub async fn get(&self, user_id: UserId) -> Arc<Workspace> {
        self.cache
            .get_with(user_id, async { Arc::new(Workspace::default()) })
            .await
    }
}

impl Default for Workspaces {
    fn default() -> Self {
        Self::new(MAX_WORKSPACES, IDLE_TIMEOUT)
    }
}

/// Workspace operations that reach the store or the generator.
pub struct WorkspaceService<'a> {
    store: &'a dyn DataStore,
    generator: &'a dyn RecipeGenerator,
    free_limit: u32,
}

impl<'a> WorkspaceService<'a> {
    #[must_use]
    pub const fn new(
        store: &'a dyn DataStore,
        generator: &'a dyn RecipeGenerator,
        free_limit: u32,
    ) -> Self {
        Self {
            store,
            generator,
            free_limit,
        }
    }

    /// Generate a recipe from the workspace image.
    ///
    /// Nothing is sent to the generator when the image is missing, another
    /// generation is running, or the user is over the free limit.
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceError::Busy` if a generation is already running,
    /// `WorkspaceError::NoImage` if no image is set,
    /// `WorkspaceError::PaymentRequired` if the paywall applies, or a
    /// generation/repository error.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn generate(
        &self,
        user_id: UserId,
        workspace: &Workspace,
        today: Weekday,
    ) -> Result<(), WorkspaceError> {
        let _guard = workspace.begin_generation().ok_or(WorkspaceError::Busy)?;

        let (image, instructions) = {
            let state = workspace.lock().await;
            let image = state.image.clone().ok_or(WorkspaceError::NoImage)?;
            (image, state.generation_instructions())
        };

        if !Paywall::new(self.store, self.free_limit)
            .can_generate(user_id)
            .await?
        {
            return Err(WorkspaceError::PaymentRequired);
        }

        let preferences = self
            .store
            .get_preferences(user_id)
            .await?
            .unwrap_or_default();

        let request = GenerationRequest {
            image,
            preferences,
            instructions,
            today,
        };
        let text = self.generator.generate(&request).await?;

        workspace.lock().await.set_draft(text);

        match self.store.increment_generation_count(user_id).await {
            Ok(count) => info!(count, "Recipe generated"),
            Err(e) => warn!(error = %e, "Failed to record generation"),
        }

        Ok(())
    }

    /// Persist the draft as a saved recipe and reset the workspace.
    ///
    /// Returns `Ok(None)` without touching the store when either the draft
    /// or the image is missing.
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceError::Repository` if the insert fails; the draft is
    /// kept in that case.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn save(
        &self,
        user_id: UserId,
        workspace: &Workspace,
    ) -> Result<Option<Recipe>, WorkspaceError> {
        let mut state = workspace.lock().await;
        let Some((text, image)) = state.pending_save() else {
            debug!("Nothing to save");
            return Ok(None);
        };

        let recipe = self
            .store
            .insert_recipe(user_id, &text, Some(&image))
            .await?;
        state.discard();

        info!(recipe_id = %recipe.id, "Recipe saved");
        Ok(Some(recipe))
    }

    /// Load a saved recipe into the workspace for editing.
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceError::RecipeNotFound` if the user has no such
    /// recipe, or `WorkspaceError::Repository` if the lookup fails.
    #[instrument(skip_all, fields(user_id = %user_id, recipe_id = %recipe_id))]
    pub async fn edit(
        &self,
        user_id: UserId,
        recipe_id: RecipeId,
        workspace: &Workspace,
    ) -> Result<(), WorkspaceError> {
        let recipe = self
            .store
            .get_recipe(user_id, recipe_id)
            .await?
            .ok_or(WorkspaceError::RecipeNotFound)?;

        workspace.lock().await.load(&recipe);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn image() -> IngredientImage {
        IngredientImage::parse("data:image/png;base64,iVBORw0KGgo=").unwrap()
    }

    fn saved(text: &str, image: Option<&str>) -> Recipe {
        Recipe {
            id: RecipeId::random(),
            user_id: UserId::random(),
            recipe_text: text.to_owned(),
            ingredients_image: image.map(str::to_owned),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_pending_save_requires_draft_and_image() {
        let mut ws = RecipeWorkspace::default();
        assert!(ws.pending_save().is_none());

        ws.set_draft("Omelette");
        assert!(ws.pending_save().is_none());

        ws.set_image(image());
        let (text, url) = ws.pending_save().unwrap();
        assert_eq!(text, "Omelette");
        assert_eq!(url, "data:image/png;base64,iVBORw0KGgo=");
    }

    #[test]
    fn test_pending_save_appends_instructions() {
        let mut ws = RecipeWorkspace::default();
        ws.set_image(image());
        ws.set_draft("Omelette");
        ws.set_instructions("extra cheese");
        let (text, _) = ws.pending_save().unwrap();
        assert_eq!(text, "Omelette\n\nAdditional Instructions:\nextra cheese");
    }

    #[test]
    fn test_set_draft_switches_view() {
        let mut ws = RecipeWorkspace::default();
        assert_eq!(ws.view(), View::Upload);
        ws.set_draft("Soup");
        assert_eq!(ws.view(), View::Recipe);
    }

    #[test]
    fn test_load_splits_instructions() {
        let mut ws = RecipeWorkspace::default();
        ws.load(&saved(
            "Stew\n\nAdditional Instructions:\nless salt",
            Some("data:image/jpeg;base64,/9j/4AAQ"),
        ));
        assert_eq!(ws.draft(), Some("Stew"));
        assert_eq!(ws.instructions(), "less salt");
        assert_eq!(ws.image().map(IngredientImage::mime_type), Some("image/jpeg"));
        assert_eq!(ws.view(), View::Upload);
    }

    #[test]
    fn test_load_drops_unreadable_image() {
        let mut ws = RecipeWorkspace::default();
        ws.set_image(image());
        ws.load(&saved("Stew", Some("not an image")));
        assert!(ws.image().is_none());
        assert_eq!(ws.instructions(), "");
    }

    #[test]
    fn test_discard_resets_everything() {
        let mut ws = RecipeWorkspace::default();
        ws.set_image(image());
        ws.set_draft("Soup");
        ws.set_instructions("spicy");
        ws.discard();
        assert_eq!(ws, RecipeWorkspace::default());
    }

    #[test]
    fn test_blank_instructions_not_sent() {
        let mut ws = RecipeWorkspace::default();
        ws.set_instructions("   ");
        assert!(ws.generation_instructions().is_none());
        ws.set_instructions(" vegan ");
        assert_eq!(ws.generation_instructions().as_deref(), Some("vegan"));
    }

    #[test]
    fn test_generation_slot_is_exclusive() {
        let ws = Workspace::default();
        let guard = ws.begin_generation().unwrap();
        assert!(ws.is_generating());
        assert!(ws.begin_generation().is_none());
        drop(guard);
        assert!(!ws.is_generating());
        assert!(ws.begin_generation().is_some());
    }

    #[tokio::test]
    async fn test_snapshot_formats_draft() {
        let ws = Workspace::default();
        ws.lock().await.set_draft("Boil water.");
        let snapshot = ws.snapshot().await;
        assert_eq!(snapshot.view, View::Recipe);
        assert_eq!(snapshot.blocks.len(), 1);
        assert!(!snapshot.generating);
    }

    #[tokio::test]
    async fn test_workspaces_are_per_user() {
        let workspaces = Workspaces::default();
        let alice = UserId::random();
        workspaces.get(alice).await.lock().await.set_instructions("hi");

        assert_eq!(workspaces.get(alice).await.lock().await.instructions(), "hi");
        assert_eq!(
            workspaces.get(UserId::random()).await.lock().await.instructions(),
            ""
        );
    }
}
