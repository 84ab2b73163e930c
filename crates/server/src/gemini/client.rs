//! Gemini API client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, instrument};

use super::types::{
    Content, ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, InlineData, Part,
};
use crate::config::GeminiConfig;
use crate::generator::{GenerationError, GenerationRequest, RecipeGenerator};

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    inner: Arc<GeminiClientInner>,
}

struct GeminiClientInner {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
}

impl GeminiClient {
    /// Create a new Gemini client.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Http` if the HTTP client cannot be built.
    pub fn new(config: &GeminiConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(GeminiClientInner {
                client,
                api_key: config.api_key.clone(),
                model: config.model.clone(),
            }),
        })
    }

    /// Model used for generation.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    fn build_url(&self, method: &str) -> String {
        format!(
            "{API_BASE_URL}/models/{}:{method}?key={}",
            self.inner.model,
            self.inner.api_key.expose_secret()
        )
    }

    fn build_request(request: &GenerationRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: None,
                parts: vec![
                    Part::Text {
                        text: request.prompt(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: request.image.mime_type().to_owned(),
                            data: request.image.base64_data().to_owned(),
                        },
                    },
                ],
            }],
        }
    }

    /// Handle an error status code.
    async fn handle_error_status(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> GenerationError {
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return GenerationError::Http(e.without_url()),
        };
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map_or(body, |envelope| envelope.error.message);

        match status {
            reqwest::StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimited(message),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                GenerationError::Unauthorized(message)
            }
            _ => GenerationError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl RecipeGenerator for GeminiClient {
    #[instrument(skip(self, request), fields(model = %self.inner.model, mime_type = %request.image.mime_type()))]
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let body = Self::build_request(request);

        debug!("Sending generateContent request to Gemini");

        // Strip the URL from transport errors; it carries the API key.
        let response = self
            .inner
            .client
            .post(self.build_url("generateContent"))
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        if !status.is_success() {
            let err = Self::handle_error_status(status, response).await;
            error!(status = %status, error = %err, "Gemini API error");
            return Err(err);
        }

        let text = response.text().await.map_err(reqwest::Error::without_url)?;
        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| GenerationError::Parse(format!("Failed to parse Gemini response: {e}")))?;

        if let Some(api_error) = parsed.error {
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message: api_error.message,
            });
        }

        let recipe = parsed.text().ok_or(GenerationError::EmptyResponse)?;
        debug!(chars = recipe.len(), "Received recipe from Gemini");
        Ok(recipe)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Weekday;
    use mealmind_core::{IngredientImage, Preferences};

    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new(&GeminiConfig {
            api_key: SecretString::from("k3y-Value"),
            model: "gemini-1.5-flash".to_owned(),
        })
        .unwrap()
    }

    #[test]
    fn test_build_url() {
        assert_eq!(
            client().build_url("generateContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent?key=k3y-Value"
        );
    }

    #[test]
    fn test_build_request_carries_image() {
        let request = GenerationRequest {
            image: IngredientImage::parse("data:image/webp;base64,UklGRg==").unwrap(),
            preferences: Preferences::default(),
            instructions: None,
            today: Weekday::Mon,
        };
        let body = serde_json::to_value(GeminiClient::build_request(&request)).unwrap();
        let parts = &body["contents"][0]["parts"];
        assert!(parts[0]["text"].as_str().unwrap().contains("Skill level"));
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/webp");
        assert_eq!(parts[1]["inline_data"]["data"], "UklGRg==");
    }
}
