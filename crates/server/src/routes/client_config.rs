//! Public configuration for the browser client.

use axum::{Json, extract::State};
use serde::Serialize;

use mealmind_core::PreferenceOptions;

use crate::state::AppState;

/// Values the browser needs to talk to Supabase and PayPal directly.
///
/// Everything here is public; secrets never appear in this response.
#[derive(Debug, Serialize)]
pub struct ClientConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub paypal_client_id: Option<String>,
    pub paypal_plan_id: Option<String>,
    pub free_generation_limit: u32,
    /// Tags offered on the preferences form.
    pub preference_options: PreferenceOptions,
}

/// GET /api/config
pub async fn show(State(state): State<AppState>) -> Json<ClientConfig> {
    let config = state.config();
    Json(ClientConfig {
        supabase_url: config.supabase.url.clone(),
        supabase_anon_key: config.supabase.anon_key.clone(),
        paypal_client_id: config.paypal.client_id.clone(),
        paypal_plan_id: config.paypal.plan_id.clone(),
        free_generation_limit: config.free_generation_limit,
        preference_options: PreferenceOptions::ALL,
    })
}
