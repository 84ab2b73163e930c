//! Recipe generation interface.
//!
//! A generator turns an ingredient photo plus the user's preferences into
//! free-form recipe text. [`crate::gemini::GeminiClient`] is the production
//! implementation; tests substitute a stub.

use std::fmt::Write as _;

use async_trait::async_trait;
use chrono::Weekday;
use thiserror::Error;

use mealmind_core::{IngredientImage, Preferences};

/// Errors that can occur while generating a recipe.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned an error.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the provider.
        message: String,
    },

    /// Rate limited or out of quota.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The API key was rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Failed to parse the provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The provider answered without any text.
    #[error("empty response from generation provider")]
    EmptyResponse,
}

/// Everything needed for one generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub image: IngredientImage,
    pub preferences: Preferences,
    /// Extra instructions typed alongside the photo.
    pub instructions: Option<String>,
    /// Day used to pick the weekday or weekend time budget.
    pub today: Weekday,
}

impl GenerationRequest {
    /// Render the text prompt sent with the image.
    ///
    /// Optional lines are omitted when empty. Skill level falls back to
    /// intermediate, and the time budget follows `today`.
    #[must_use]
    pub fn prompt(&self) -> String {
        let prefs = &self.preferences;
        let mut prompt = String::from(
            "Analyze this image and identify the ingredients. Then, create a recipe considering these preferences:\n",
        );

        if !prefs.dietary.is_empty() {
            let _ = writeln!(prompt, "Dietary restrictions: {}", prefs.dietary.join(", "));
        }
        let _ = writeln!(prompt, "Skill level: {}", prefs.effective_skill_level());
        let _ = writeln!(
            prompt,
            "Time available: {} minutes",
            prefs.time.budget_for(self.today)
        );
        if !prefs.equipment.is_empty() {
            let _ = writeln!(prompt, "Available equipment: {}", prefs.equipment.join(", "));
        }
        if !prefs.cuisines.is_empty() {
            let _ = writeln!(prompt, "Preferred cuisines: {}", prefs.cuisines.join(", "));
        }
        if let Some(instructions) = self
            .instructions
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let _ = writeln!(prompt, "Additional Instructions: {instructions}");
        }

        prompt.push_str(
            "\nPlease provide:\n\
             1. List of identified ingredients with confidence scores\n\
             2. Complete recipe with instructions\n\
             3. Cooking time and difficulty rating\n\
             4. Nutritional information",
        );
        prompt
    }
}

/// Generates recipe text from an ingredient photo.
#[async_trait]
pub trait RecipeGenerator: Send + Sync {
    /// Run one generation. No retries.
    ///
    /// # Errors
    ///
    /// Returns a [`GenerationError`] if the provider call fails or returns no text.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mealmind_core::{SkillLevel, TimePreferences};

    use super::*;

    fn request(preferences: Preferences, today: Weekday) -> GenerationRequest {
        GenerationRequest {
            image: IngredientImage::parse("data:image/jpeg;base64,/9j/4AAQ").unwrap(),
            preferences,
            instructions: None,
            today,
        }
    }

    #[test]
    fn test_prompt_defaults() {
        let prompt = request(Preferences::default(), Weekday::Tue).prompt();
        assert!(prompt.starts_with("Analyze this image and identify the ingredients."));
        assert!(prompt.contains("Skill level: intermediate\n"));
        assert!(prompt.contains("Time available: 30 minutes\n"));
        assert!(!prompt.contains("Dietary restrictions"));
        assert!(!prompt.contains("Additional Instructions"));
        assert!(prompt.ends_with("4. Nutritional information"));
    }

    #[test]
    fn test_prompt_with_preferences() {
        let prefs = Preferences {
            skill_level: Some(SkillLevel::Beginner),
            dietary: vec!["vegan".into(), "gluten-free".into()],
            equipment: vec!["oven".into()],
            cuisines: vec!["italian".into()],
            time: TimePreferences {
                weekday: 20,
                weekend: 90,
            },
        };
        let mut req = request(prefs, Weekday::Sat);
        req.instructions = Some("  no nuts ".into());
        let prompt = req.prompt();

        assert!(prompt.contains("Dietary restrictions: vegan, gluten-free\n"));
        assert!(prompt.contains("Skill level: beginner\n"));
        assert!(prompt.contains("Time available: 90 minutes\n"));
        assert!(prompt.contains("Available equipment: oven\n"));
        assert!(prompt.contains("Preferred cuisines: italian\n"));
        assert!(prompt.contains("Additional Instructions: no nuts\n"));
    }
}
