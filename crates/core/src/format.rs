//! Heuristic formatter for generated recipe text.
//!
//! The generation provider returns free-form text with loose markdown-ish
//! structure (bold headings, numbered steps, `Key: value` lines, ingredient
//! lines annotated with `(Confidence: ...)`). This module turns that text into
//! typed [`Block`]s for display. It never fails: anything it cannot classify
//! becomes a [`Block::Paragraph`].

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

const CONFIDENCE_MARKER: &str = "(Confidence:";

/// Start of a section: `1.`, `Word:`, `**Title:**`, or `**Title**`.
///
/// The bold-title alternative is only a section start when it is not directly
/// followed by `:`; that check happens in [`starts_section`].
static SECTION_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+\.|[A-Za-z]+:|\*\*[^*]+:\*\*|(\*\*[^*]+\*\*))").expect("Invalid regex")
});

static STEP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.\s*(.*)$").expect("Invalid regex"));

/// One displayable piece of a formatted recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading { text: String },
    Ingredient { name: String, confidence: String },
    Step { number: u32, text: String },
    KeyValue { key: String, value: String },
    Bullet { text: String },
    Paragraph { text: String },
}

impl Block {
    /// Short machine name of the block kind, as used in serialized output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Heading { .. } => "heading",
            Self::Ingredient { .. } => "ingredient",
            Self::Step { .. } => "step",
            Self::KeyValue { .. } => "key_value",
            Self::Bullet { .. } => "bullet",
            Self::Paragraph { .. } => "paragraph",
        }
    }
}

/// Format recipe text into blocks.
///
/// # Examples
///
/// ```
/// use mealmind_core::{Block, format_recipe};
///
/// let blocks = format_recipe("Just stir it.");
/// assert_eq!(blocks, vec![Block::Paragraph { text: "Just stir it.".into() }]);
///
/// assert!(format_recipe("   ").is_empty());
/// ```
#[must_use]
pub fn format_recipe(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    for section in split_sections(text) {
        parse_section(&section, &mut blocks);
    }
    blocks
}

/// Split at every newline that is immediately followed by a section start.
/// The newline itself is dropped.
fn split_sections(text: &str) -> Vec<String> {
    let mut sections: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            if starts_section(line) {
                sections.push(std::mem::take(&mut current));
            } else {
                current.push('\n');
            }
        }
        current.push_str(line);
    }
    sections.push(current);
    sections
}

fn starts_section(line: &str) -> bool {
    let Some(caps) = SECTION_START_RE.captures(line) else {
        return false;
    };
    match caps.get(1) {
        // `**Title**` followed by `:` is not a section start
        Some(bold) => !line
            .get(bold.end()..)
            .is_some_and(|rest| rest.starts_with(':')),
        None => true,
    }
}

fn parse_section(section: &str, out: &mut Vec<Block>) {
    if let Some((name, rest)) = section.split_once(CONFIDENCE_MARKER) {
        let name = name.replace('*', "");
        let rest = rest.split_once(')').map_or(rest, |(inner, _)| inner);
        let confidence: String = rest
            .chars()
            .filter(|c| !matches!(c, '*' | '(' | ')' | '\n' | '\r'))
            .collect();
        out.push(Block::Ingredient {
            name: name.trim().to_owned(),
            confidence: confidence.trim().to_owned(),
        });
        return;
    }

    let trimmed = section.trim();
    if trimmed.is_empty() {
        return;
    }

    if trimmed.starts_with("**") {
        let mut lines = trimmed.lines();
        let title = lines.next().unwrap_or_default().replace("**", "");
        let title = title.trim();
        if !title.is_empty() {
            out.push(Block::Heading {
                text: title.to_owned(),
            });
        }
        for line in lines {
            let line = line.trim();
            if !line.is_empty() {
                out.push(parse_line(line));
            }
        }
        return;
    }

    out.push(Block::Paragraph {
        text: trimmed.to_owned(),
    });
}

/// Classify one non-blank line inside a headed section.
fn parse_line(line: &str) -> Block {
    if let Some(rest) = strip_bullet(line) {
        return Block::Bullet {
            text: rest.trim().to_owned(),
        };
    }

    if let Some(caps) = STEP_RE.captures(line) {
        let number = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
        if let (Some(number), Some(text)) = (number, caps.get(2)) {
            return Block::Step {
                number,
                text: text.as_str().trim().to_owned(),
            };
        }
    }

    if let Some((key, value)) = line.split_once(':') {
        let key = key.trim();
        if !key.is_empty() {
            return Block::KeyValue {
                key: key.to_owned(),
                value: value.trim().to_owned(),
            };
        }
    }

    Block::Paragraph {
        text: line.to_owned(),
    }
}

fn strip_bullet(line: &str) -> Option<&str> {
    line.strip_prefix('•')
        .or_else(|| line.strip_prefix("- "))
        .or_else(|| line.strip_prefix("* "))
}

/// Render blocks as plain text for terminals and printouts.
#[must_use]
pub fn render_text(blocks: &[Block]) -> String {
    let mut out = String::new();
    for (i, block) in blocks.iter().enumerate() {
        match block {
            Block::Heading { text } => {
                if i > 0 {
                    out.push('\n');
                }
                let _ = writeln!(out, "{text}");
                let _ = writeln!(out, "{}", "-".repeat(text.chars().count()));
            }
            Block::Ingredient { name, confidence } => {
                let _ = writeln!(out, "• {name} (confidence: {confidence})");
            }
            Block::Step { number, text } => {
                let _ = writeln!(out, "{number}. {text}");
            }
            Block::KeyValue { key, value } => {
                let _ = writeln!(out, "{key}: {value}");
            }
            Block::Bullet { text } => {
                let _ = writeln!(out, "• {text}");
            }
            Block::Paragraph { text } => {
                let _ = writeln!(out, "{text}");
            }
        }
    }
    out
}
