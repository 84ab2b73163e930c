//! Domain models for MealMind.
//!
//! These types represent validated domain objects separate from database row
//! types (see `crate::db`).

pub mod pantry;
pub mod recipe;
pub mod subscription;

pub use pantry::{NewPantryItem, PantryItem};
pub use recipe::Recipe;
pub use subscription::{Subscription, UsageSummary};
