//! MealMind server library.
//!
//! Recipe generation from ingredient photos: an axum JSON API over a
//! per-user draft workspace, Gemini for generation, Supabase for identity,
//! Postgres for saved recipes, pantry, preferences and subscriptions.
//!
//! The router is built here so integration tests can drive it with fakes.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod gemini;
pub mod generator;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod supabase;

use axum::{Router, extract::Request, middleware::from_fn};
use tower_http::trace::TraceLayer;

pub use routes::RateLimiting;
pub use state::AppState;

/// Build the application router with its middleware stack.
///
/// Sentry layers and static files are added by the binary.
pub fn app(state: AppState, rate_limiting: RateLimiting) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    routes::routes(rate_limiting)
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(trace)
        .with_state(state)
}
