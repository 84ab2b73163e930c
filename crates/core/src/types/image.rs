//! Ingredient image carried as a base64 data URL.

use core::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`IngredientImage`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// The input is empty.
    #[error("image cannot be empty")]
    Empty,
    /// The input is not a `data:<mime>;base64,<payload>` URL.
    #[error("image must be a base64 data URL")]
    NotDataUrl,
    /// The declared MIME type is not an accepted image type.
    #[error("unsupported image type: {0}")]
    UnsupportedMime(String),
    /// The payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),
    /// The decoded image is larger than allowed.
    #[error("image must be at most {max} bytes")]
    TooLarge {
        /// Maximum allowed decoded size.
        max: usize,
    },
}

/// An ingredient photo.
///
/// Stored and transported as a data URL (the form browsers produce from a
/// file reader or a canvas snapshot). The generation request needs the MIME
/// type and the raw base64 payload separately; both are available here.
///
/// ## Constraints
///
/// - MIME type: one of [`IngredientImage::ACCEPTED_MIME_TYPES`]
/// - Payload: valid standard base64
/// - Decoded size: at most [`IngredientImage::MAX_BYTES`]
///
/// ## Examples
///
/// ```
/// use mealmind_core::IngredientImage;
///
/// let image = IngredientImage::parse("data:image/png;base64,iVBORw0KGgo=").unwrap();
/// assert_eq!(image.mime_type(), "image/png");
/// assert_eq!(image.base64_data(), "iVBORw0KGgo=");
///
/// assert!(IngredientImage::parse("https://example.com/a.png").is_err());
/// assert!(IngredientImage::parse("data:text/plain;base64,aGk=").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IngredientImage {
    mime_type: String,
    data: String,
}

impl IngredientImage {
    /// Maximum decoded image size (10 MiB).
    pub const MAX_BYTES: usize = 10 * 1024 * 1024;

    /// Image types the generation provider accepts.
    pub const ACCEPTED_MIME_TYPES: &'static [&'static str] = &[
        "image/jpeg",
        "image/png",
        "image/webp",
        "image/heic",
        "image/heif",
    ];

    /// Parse an image from a data URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty
    /// - Is not a `data:` URL with a `;base64` marker
    /// - Declares an unsupported MIME type
    /// - Has an invalid or oversized base64 payload
    pub fn parse(s: &str) -> Result<Self, ImageError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ImageError::Empty);
        }

        let rest = s.strip_prefix("data:").ok_or(ImageError::NotDataUrl)?;
        let (header, payload) = rest.split_once(',').ok_or(ImageError::NotDataUrl)?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or(ImageError::NotDataUrl)?
            .to_ascii_lowercase();

        let mime_type = normalize_mime(&mime_type);
        if !Self::ACCEPTED_MIME_TYPES.contains(&mime_type.as_str()) {
            return Err(ImageError::UnsupportedMime(mime_type));
        }

        let decoded = STANDARD
            .decode(payload)
            .map_err(|e| ImageError::InvalidBase64(e.to_string()))?;
        if decoded.is_empty() {
            return Err(ImageError::Empty);
        }
        if decoded.len() > Self::MAX_BYTES {
            return Err(ImageError::TooLarge {
                max: Self::MAX_BYTES,
            });
        }

        Ok(Self {
            mime_type,
            data: payload.to_owned(),
        })
    }

    /// Build an image from raw file bytes.
    ///
    /// When `declared_mime` is absent or generic (`application/octet-stream`),
    /// the type is sniffed from the file's magic bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are empty, too large, or not a supported
    /// image type.
    pub fn from_bytes(declared_mime: Option<&str>, bytes: &[u8]) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        if bytes.len() > Self::MAX_BYTES {
            return Err(ImageError::TooLarge {
                max: Self::MAX_BYTES,
            });
        }

        let mime_type = match declared_mime.map(str::to_ascii_lowercase) {
            Some(m) if m != "application/octet-stream" && !m.is_empty() => normalize_mime(&m),
            _ => sniff_mime(bytes)
                .ok_or_else(|| ImageError::UnsupportedMime("unknown".to_owned()))?
                .to_owned(),
        };
        if !Self::ACCEPTED_MIME_TYPES.contains(&mime_type.as_str()) {
            return Err(ImageError::UnsupportedMime(mime_type));
        }

        Ok(Self {
            mime_type,
            data: STANDARD.encode(bytes),
        })
    }

    /// The declared MIME type (e.g. `image/jpeg`).
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The base64 payload, without the data URL header.
    #[must_use]
    pub fn base64_data(&self) -> &str {
        &self.data
    }

    /// Render back to a data URL.
    #[must_use]
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

impl fmt::Display for IngredientImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.data)
    }
}

impl TryFrom<String> for IngredientImage {
    type Error = ImageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<IngredientImage> for String {
    fn from(image: IngredientImage) -> Self {
        image.to_data_url()
    }
}

impl std::str::FromStr for IngredientImage {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn normalize_mime(mime: &str) -> String {
    match mime {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_owned(),
        other => other.to_owned(),
    }
}

/// Guess the image type from magic bytes.
fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, b'P', b'N', b'G', ..] => Some("image/png"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_data_url() {
        let image = IngredientImage::parse("data:image/jpeg;base64,/9j/4AAQ").unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");
        assert_eq!(image.base64_data(), "/9j/4AAQ");
        assert_eq!(image.to_data_url(), "data:image/jpeg;base64,/9j/4AAQ");
    }

    #[test]
    fn test_parse_normalizes_jpg_alias() {
        let image = IngredientImage::parse("data:image/JPG;base64,/9j/4AAQ").unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(IngredientImage::parse("  "), Err(ImageError::Empty));
    }

    #[test]
    fn test_parse_not_data_url() {
        assert_eq!(
            IngredientImage::parse("image/png;base64,abc"),
            Err(ImageError::NotDataUrl)
        );
        assert_eq!(
            IngredientImage::parse("data:image/png,abc"),
            Err(ImageError::NotDataUrl)
        );
    }

    #[test]
    fn test_parse_unsupported_mime() {
        assert!(matches!(
            IngredientImage::parse("data:image/gif;base64,R0lGOD=="),
            Err(ImageError::UnsupportedMime(m)) if m == "image/gif"
        ));
    }

    #[test]
    fn test_parse_bad_base64() {
        assert!(matches!(
            IngredientImage::parse("data:image/png;base64,***"),
            Err(ImageError::InvalidBase64(_))
        ));
    }

    #[test]
    fn test_from_bytes_sniffs_png() {
        let bytes = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        let image = IngredientImage::from_bytes(None, &bytes).unwrap();
        assert_eq!(image.mime_type(), "image/png");
        assert!(image.to_data_url().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_from_bytes_rejects_unknown() {
        assert!(matches!(
            IngredientImage::from_bytes(Some("application/octet-stream"), b"hello"),
            Err(ImageError::UnsupportedMime(_))
        ));
    }

    #[test]
    fn test_serde_as_data_url_string() {
        let image = IngredientImage::parse("data:image/png;base64,iVBORw0KGgo=").unwrap();
        let json = serde_json::to_string(&image).unwrap();
        assert_eq!(json, "\"data:image/png;base64,iVBORw0KGgo=\"");

        let back: IngredientImage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, image);

        assert!(serde_json::from_str::<IngredientImage>("\"nope\"").is_err());
    }
}
