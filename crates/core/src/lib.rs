//! MealMind Core - Shared domain library.
//!
//! This crate provides the types and pure logic used across all MealMind components:
//! - `server` - HTTP API, recipe pages, and the payment webhook
//! - `cli` - Command-line tools for migrations and offline formatting
//!
//! # Architecture
//!
//! The core crate contains only types, traits, and pure functions - no network,
//! no database access, no HTTP clients. Device access (the camera) is expressed
//! through traits so that the capture state machine can be driven by any
//! front end and tested without hardware.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, statuses, preferences, and ingredient images
//! - [`format`] - Heuristic parser from generated recipe text to display blocks
//! - [`capture`] - Camera capture state machine
//! - [`recipe`] - Composition of saved recipe text with additional instructions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod capture;
pub mod format;
pub mod recipe;
pub mod types;

pub use format::{Block, format_recipe, render_text};
pub use types::*;
