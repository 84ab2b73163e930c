//! Gemini REST request and response types.

use serde::{Deserialize, Serialize};

/// `generateContent` request body.
#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

/// One turn of content.
#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A content part: text or inline binary data.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inline_data", alias = "inlineData")]
        inline_data: InlineData,
    },
}

/// Base64 payload with its MIME type.
#[derive(Debug, Serialize, Deserialize)]
pub struct InlineData {
    #[serde(rename = "mime_type", alias = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

/// `generateContent` response body.
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
    pub error: Option<ApiError>,
}

/// Response candidate.
#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
    #[serde(rename = "finishReason")]
    pub finish_reason: Option<String>,
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub message: String,
}

/// Error envelope returned on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ApiError,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.as_ref()?.first()?.content.as_ref()?.parts;
        let text: String = parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                Part::InlineData { .. } => None,
            })
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}
