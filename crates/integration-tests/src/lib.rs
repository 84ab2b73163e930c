//! Integration tests for MealMind.
//!
//! Tests drive the real router with `tower::ServiceExt::oneshot`. The data
//! store, recipe generator and identity provider are in-memory fakes, so no
//! database or network access is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p mealmind-integration-tests
//! ```
//!
//! # Fakes
//!
//! - [`MemoryStore`] - every store trait over plain collections, with call counters
//! - [`StubGenerator`] - canned recipe text, call counter, optional gate to hold
//!   a generation in flight
//! - [`StubIdentity`] - accepts tokens of the form `token-<user uuid>`

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tokio::sync::Notify;
use tower::ServiceExt;

use mealmind_core::{
    PantryItemId, Preferences, RecipeId, SubscriptionId, SubscriptionStatus, UserId,
};
use mealmind_server::config::{GeminiConfig, MealMindConfig, PayPalConfig, SupabaseConfig};
use mealmind_server::db::RepositoryError;
use mealmind_server::generator::{GenerationError, GenerationRequest, RecipeGenerator};
use mealmind_server::identity::{AuthenticatedUser, IdentityError, IdentityProvider};
use mealmind_server::models::{NewPantryItem, PantryItem, Recipe, Subscription};
use mealmind_server::models::subscription::PAYPAL_PROVIDER;
use mealmind_server::store::{DataStore, PantryStore, ProfileStore, RecipeStore, SubscriptionStore};
use mealmind_server::{AppState, RateLimiting};

/// Free generations allowed in tests.
pub const TEST_FREE_LIMIT: u32 = 2;

/// Recipe text returned by [`StubGenerator`] unless overridden.
pub const SAMPLE_RECIPE: &str = "**Tomato Basil Pasta**\n\
**Tomatoes** (Confidence: 95%)\n\
**Basil** (Confidence: 80%)\n\
**Instructions**\n  1. Boil the pasta\n  2. Toss with tomatoes and basil";

/// A small valid PNG data URL.
pub const SAMPLE_IMAGE: &str = "data:image/png;base64,iVBORw0KGgo=";

// =============================================================================
// MemoryStore
// =============================================================================

#[derive(Default)]
struct MemoryData {
    recipes: Vec<Recipe>,
    pantry: Vec<PantryItem>,
    profiles: HashMap<UserId, Preferences>,
    subscriptions: Vec<Subscription>,
    generations: HashMap<UserId, u32>,
}

/// In-memory implementation of every store trait.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<MemoryData>,
    recipe_inserts: AtomicUsize,
}

impl MemoryStore {
    fn data(&self) -> MutexGuard<'_, MemoryData> {
        self.data.lock().expect("memory store lock poisoned")
    }

    /// Number of `insert_recipe` calls so far.
    pub fn recipe_inserts(&self) -> usize {
        self.recipe_inserts.load(Ordering::SeqCst)
    }

    /// All recipes saved by `user_id`, oldest first.
    pub fn recipes_of(&self, user_id: UserId) -> Vec<Recipe> {
        self.data()
            .recipes
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Insert a recipe directly, bypassing the workspace.
    pub fn seed_recipe(&self, user_id: UserId, text: &str, image: Option<&str>) -> Recipe {
        let recipe = Recipe {
            id: RecipeId::random(),
            user_id,
            recipe_text: text.to_owned(),
            ingredients_image: image.map(str::to_owned),
            created_at: Utc::now(),
        };
        self.data().recipes.push(recipe.clone());
        recipe
    }

    /// Insert a subscription directly.
    pub fn seed_subscription(
        &self,
        user_id: UserId,
        paypal_subscription_id: &str,
        status: SubscriptionStatus,
    ) {
        self.data().subscriptions.push(Subscription {
            id: SubscriptionId::random(),
            user_id,
            status,
            payment_provider: PAYPAL_PROVIDER.to_owned(),
            paypal_subscription_id: Some(paypal_subscription_id.to_owned()),
            current_period_end: None,
            created_at: Utc::now(),
        });
    }

    /// The user's subscription, if any.
    pub fn subscription_of(&self, user_id: UserId) -> Option<Subscription> {
        self.data()
            .subscriptions
            .iter()
            .find(|s| s.user_id == user_id)
            .cloned()
    }

    pub fn set_generation_count(&self, user_id: UserId, count: u32) {
        self.data().generations.insert(user_id, count);
    }

    pub fn generations_of(&self, user_id: UserId) -> u32 {
        self.data().generations.get(&user_id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl RecipeStore for MemoryStore {
    async fn list_recipes(&self, user_id: UserId) -> Result<Vec<Recipe>, RepositoryError> {
        let mut recipes = self.recipes_of(user_id);
        recipes.reverse();
        Ok(recipes)
    }

    async fn get_recipe(
        &self,
        user_id: UserId,
        id: RecipeId,
    ) -> Result<Option<Recipe>, RepositoryError> {
        Ok(self
            .data()
            .recipes
            .iter()
            .find(|r| r.id == id && r.user_id == user_id)
            .cloned())
    }

    async fn insert_recipe(
        &self,
        user_id: UserId,
        recipe_text: &str,
        ingredients_image: Option<&str>,
    ) -> Result<Recipe, RepositoryError> {
        self.recipe_inserts.fetch_add(1, Ordering::SeqCst);
        Ok(self.seed_recipe(user_id, recipe_text, ingredients_image))
    }

    async fn delete_recipe(&self, user_id: UserId, id: RecipeId) -> Result<bool, RepositoryError> {
        let mut data = self.data();
        let before = data.recipes.len();
        data.recipes.retain(|r| !(r.id == id && r.user_id == user_id));
        Ok(data.recipes.len() < before)
    }
}

#[async_trait]
impl PantryStore for MemoryStore {
    async fn list_pantry_items(&self, user_id: UserId) -> Result<Vec<PantryItem>, RepositoryError> {
        Ok(self
            .data()
            .pantry
            .iter()
            .rev()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn add_pantry_item(
        &self,
        user_id: UserId,
        item: &NewPantryItem,
    ) -> Result<PantryItem, RepositoryError> {
        let created = PantryItem {
            id: PantryItemId::random(),
            user_id,
            name: item.name.clone(),
            quantity: item.quantity_or_default(),
            unit: item.unit.clone(),
            expiry_date: item.expiry_date,
            created_at: Utc::now(),
        };
        self.data().pantry.push(created.clone());
        Ok(created)
    }

    async fn delete_pantry_items(
        &self,
        user_id: UserId,
        ids: &[PantryItemId],
    ) -> Result<u64, RepositoryError> {
        let mut data = self.data();
        let before = data.pantry.len();
        data.pantry
            .retain(|i| !(i.user_id == user_id && ids.contains(&i.id)));
        Ok(u64::try_from(before - data.pantry.len()).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get_preferences(
        &self,
        user_id: UserId,
    ) -> Result<Option<Preferences>, RepositoryError> {
        Ok(self.data().profiles.get(&user_id).cloned())
    }

    async fn upsert_preferences(
        &self,
        user_id: UserId,
        preferences: &Preferences,
    ) -> Result<(), RepositoryError> {
        self.data().profiles.insert(user_id, preferences.clone());
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn get_subscription(
        &self,
        user_id: UserId,
    ) -> Result<Option<Subscription>, RepositoryError> {
        Ok(self.subscription_of(user_id))
    }

    async fn record_pending_subscription(
        &self,
        user_id: UserId,
        paypal_subscription_id: &str,
    ) -> Result<Subscription, RepositoryError> {
        let mut data = self.data();
        data.subscriptions.retain(|s| s.user_id != user_id);
        let subscription = Subscription {
            id: SubscriptionId::random(),
            user_id,
            status: SubscriptionStatus::Pending,
            payment_provider: PAYPAL_PROVIDER.to_owned(),
            paypal_subscription_id: Some(paypal_subscription_id.to_owned()),
            current_period_end: None,
            created_at: Utc::now(),
        };
        data.subscriptions.push(subscription.clone());
        Ok(subscription)
    }

    async fn update_subscription_status(
        &self,
        paypal_subscription_id: &str,
        status: SubscriptionStatus,
        current_period_end: Option<DateTime<Utc>>,
    ) -> Result<u64, RepositoryError> {
        let mut updated = 0;
        for sub in &mut self.data().subscriptions {
            if sub.paypal_subscription_id.as_deref() == Some(paypal_subscription_id) {
                sub.status = status;
                if current_period_end.is_some() {
                    sub.current_period_end = current_period_end;
                }
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn generation_count(&self, user_id: UserId) -> Result<u32, RepositoryError> {
        Ok(self.generations_of(user_id))
    }

    async fn increment_generation_count(&self, user_id: UserId) -> Result<u32, RepositoryError> {
        let mut data = self.data();
        let count = data.generations.entry(user_id).or_insert(0);
        *count += 1;
        Ok(*count)
    }
}

impl DataStore for MemoryStore {}

// =============================================================================
// StubGenerator
// =============================================================================

/// Holds a generation in flight until released.
#[derive(Default)]
pub struct GenerationGate {
    pub started: Notify,
    pub release: Notify,
}

/// Generator that returns canned text and counts calls.
pub struct StubGenerator {
    response: Mutex<Option<String>>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
    gate: Option<Arc<GenerationGate>>,
}

impl StubGenerator {
    #[must_use]
    pub fn new(response: &str) -> Self {
        Self {
            response: Mutex::new(Some(response.to_owned())),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
            gate: None,
        }
    }

    /// A generator that waits on `gate` before answering.
    #[must_use]
    pub fn gated(response: &str, gate: Arc<GenerationGate>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(response)
        }
    }

    /// Make later calls fail with an empty response.
    pub fn fail(&self) {
        *self.response.lock().expect("generator lock poisoned") = None;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompt text of the most recent call.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt
            .lock()
            .expect("generator lock poisoned")
            .clone()
    }
}

#[async_trait]
impl RecipeGenerator for StubGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().expect("generator lock poisoned") = Some(request.prompt());

        if let Some(gate) = &self.gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }

        self.response
            .lock()
            .expect("generator lock poisoned")
            .clone()
            .ok_or(GenerationError::EmptyResponse)
    }
}

// =============================================================================
// StubIdentity
// =============================================================================

/// Identity provider that accepts `token-<uuid>` bearer tokens.
pub struct StubIdentity;

impl StubIdentity {
    /// Bearer token for `user_id`.
    #[must_use]
    pub fn token_for(user_id: UserId) -> String {
        format!("token-{user_id}")
    }
}

#[async_trait]
impl IdentityProvider for StubIdentity {
    async fn authenticate(&self, access_token: &str) -> Result<AuthenticatedUser, IdentityError> {
        let id = access_token
            .strip_prefix("token-")
            .and_then(|raw| raw.parse::<UserId>().ok())
            .ok_or(IdentityError::InvalidToken)?;
        Ok(AuthenticatedUser {
            id,
            email: Some(format!("{id}@example.test")),
        })
    }
}

// =============================================================================
// TestApp
// =============================================================================

/// Configuration with test values; nothing here is contacted.
#[must_use]
pub fn test_config() -> MealMindConfig {
    MealMindConfig {
        database_url: SecretString::from("postgres://localhost/mealmind_test"),
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 3000,
        base_url: "http://127.0.0.1:3000".to_owned(),
        supabase: SupabaseConfig {
            url: "http://127.0.0.1:54321".to_owned(),
            anon_key: "test-anon-key".to_owned(),
        },
        gemini: GeminiConfig {
            api_key: SecretString::from("unused"),
            model: "gemini-1.5-flash".to_owned(),
        },
        paypal: PayPalConfig {
            client_id: Some("test-client".to_owned()),
            plan_id: Some("P-TEST".to_owned()),
        },
        free_generation_limit: TEST_FREE_LIMIT,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Response status and body, parsed as JSON when possible.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: serde_json::Value,
    pub text: String,
}

/// The router wired to fakes.
#[derive(Clone)]
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub generator: Arc<StubGenerator>,
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        Self::with_generator(StubGenerator::new(SAMPLE_RECIPE))
    }

    #[must_use]
    pub fn with_generator(generator: StubGenerator) -> Self {
        let store = Arc::new(MemoryStore::default());
        let generator = Arc::new(generator);
        let state = AppState::new(
            test_config(),
            store.clone(),
            generator.clone(),
            Arc::new(StubIdentity),
        );

        Self {
            router: mealmind_server::app(state, RateLimiting::Disabled),
            store,
            generator,
        }
    }

    /// Send a request, optionally authenticated as `user` with a JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<UserId>,
        body: Option<serde_json::Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user_id) = user {
            builder = builder.header(
                header::AUTHORIZATION,
                format!("Bearer {}", StubIdentity::token_for(user_id)),
            );
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.send_request(builder.body(body).expect("valid request"))
            .await
    }

    /// Send a fully built request.
    pub async fn send_request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

        TestResponse {
            status,
            headers,
            body,
            text,
        }
    }

    pub async fn get(&self, uri: &str, user: UserId) -> TestResponse {
        self.send(Method::GET, uri, Some(user), None).await
    }

    pub async fn post(&self, uri: &str, user: UserId, body: serde_json::Value) -> TestResponse {
        self.send(Method::POST, uri, Some(user), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: UserId, body: serde_json::Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(user), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: UserId) -> TestResponse {
        self.send(Method::DELETE, uri, Some(user), None).await
    }

    /// Set the workspace image from [`SAMPLE_IMAGE`].
    pub async fn upload_sample_image(&self, user: UserId) -> TestResponse {
        self.put(
            "/api/workspace/image",
            user,
            serde_json::json!({ "image": SAMPLE_IMAGE }),
        )
        .await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
