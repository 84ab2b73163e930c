//! Core types for MealMind.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod image;
pub mod preferences;
pub mod status;

pub use id::*;
pub use image::{ImageError, IngredientImage};
pub use preferences::{PreferenceOptions, Preferences, TimePreferences};
pub use status::*;
