//! Saved recipe text.
//!
//! A saved recipe is a single text column. Extra instructions the user typed
//! alongside the photo are appended under a fixed marker so they can be split
//! back out when the recipe is loaded for editing.

/// Separator between the generated recipe and the user's extra instructions.
pub const INSTRUCTIONS_MARKER: &str = "\n\nAdditional Instructions:\n";

/// Join a recipe draft and optional extra instructions into the stored text.
///
/// Blank instructions are not appended.
///
/// ```
/// use mealmind_core::recipe::{compose, split};
///
/// let text = compose("Pasta", "no salt");
/// assert_eq!(text, "Pasta\n\nAdditional Instructions:\nno salt");
/// assert_eq!(split(&text), ("Pasta", "no salt"));
/// assert_eq!(compose("Pasta", "  "), "Pasta");
/// ```
#[must_use]
pub fn compose(draft: &str, instructions: &str) -> String {
    if instructions.trim().is_empty() {
        draft.to_owned()
    } else {
        format!("{draft}{INSTRUCTIONS_MARKER}{instructions}")
    }
}

/// Split stored text into `(draft, instructions)` at the first marker.
///
/// Text without the marker is all draft.
#[must_use]
pub fn split(text: &str) -> (&str, &str) {
    text.split_once(INSTRUCTIONS_MARKER).unwrap_or((text, ""))
}

/// First non-blank line of the recipe, stripped of markdown emphasis, for
/// list views. Falls back to `"Untitled recipe"`.
#[must_use]
pub fn title(text: &str) -> String {
    text.lines()
        .map(|line| line.replace(['*', '#'], ""))
        .map(|line| line.trim().to_owned())
        .find(|line| !line.is_empty())
        .unwrap_or_else(|| "Untitled recipe".to_owned())
}
