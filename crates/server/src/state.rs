//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::MealMindConfig;
use crate::generator::RecipeGenerator;
use crate::identity::IdentityProvider;
use crate::services::{Paywall, WorkspaceService, Workspaces};
use crate::store::DataStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. External services sit behind
/// trait objects so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: MealMindConfig,
    store: Arc<dyn DataStore>,
    generator: Arc<dyn RecipeGenerator>,
    identity: Arc<dyn IdentityProvider>,
    workspaces: Workspaces,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `store` - Persistence backend (Postgres in production)
    /// * `generator` - Recipe generator (Gemini in production)
    /// * `identity` - Access-token validator (Supabase in production)
    #[must_use]
    pub fn new(
        config: MealMindConfig,
        store: Arc<dyn DataStore>,
        generator: Arc<dyn RecipeGenerator>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                generator,
                identity,
                workspaces: Workspaces::default(),
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &MealMindConfig {
        &self.inner.config
    }

    /// Get a reference to the persistence backend.
    #[must_use]
    pub fn store(&self) -> &dyn DataStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the recipe generator.
    #[must_use]
    pub fn generator(&self) -> &dyn RecipeGenerator {
        self.inner.generator.as_ref()
    }

    /// Get a reference to the identity provider.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.inner.identity.as_ref()
    }

    /// Get a reference to the live workspaces.
    #[must_use]
    pub fn workspaces(&self) -> &Workspaces {
        &self.inner.workspaces
    }

    /// Workspace service bound to this state's store and generator.
    #[must_use]
    pub fn workspace_service(&self) -> WorkspaceService<'_> {
        WorkspaceService::new(
            self.store(),
            self.generator(),
            self.config().free_generation_limit,
        )
    }

    /// Paywall bound to this state's store.
    #[must_use]
    pub fn paywall(&self) -> Paywall<'_, dyn DataStore + '_> {
        Paywall::new(self.store(), self.config().free_generation_limit)
    }
}
