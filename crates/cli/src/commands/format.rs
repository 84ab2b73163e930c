//! Recipe formatting command.

use std::io::Read;
use std::path::Path;

use thiserror::Error;

use mealmind_core::{format_recipe, render_text};

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Format the recipe in `file` (`-` for stdin).
///
/// # Errors
///
/// Returns `FormatError` if the input cannot be read or encoded.
pub fn run(file: &Path, json: bool) -> Result<String, FormatError> {
    let text = read_input(file)?;
    format_text(&text, json)
}

fn read_input(file: &Path) -> Result<String, FormatError> {
    let read_error = |source| FormatError::Read {
        path: file.display().to_string(),
        source,
    };

    if file.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(read_error)?;
        Ok(text)
    } else {
        std::fs::read_to_string(file).map_err(read_error)
    }
}

fn format_text(text: &str, json: bool) -> Result<String, FormatError> {
    let blocks = format_recipe(text);
    if json {
        Ok(serde_json::to_string_pretty(&blocks)?)
    } else {
        Ok(render_text(&blocks))
    }
}
