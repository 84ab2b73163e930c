//! Google Gemini client for recipe generation.
//!
//! One `generateContent` call per recipe: the prompt text and the ingredient
//! photo as inline data.

mod client;
mod types;

pub use client::GeminiClient;
