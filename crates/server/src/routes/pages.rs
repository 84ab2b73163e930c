//! Server-rendered recipe page.
//!
//! A printable view of one saved recipe, built from the same blocks the JSON
//! API returns.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use tracing::instrument;

use mealmind_core::{Block, RecipeId};

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireUser;
use crate::routes::recipes::find_recipe;
use crate::state::AppState;

/// One formatted block, flattened for templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockView {
    /// Block kind, see [`Block::kind`].
    pub kind: &'static str,
    /// Main text: heading, step, bullet or paragraph text, ingredient name, or value.
    pub text: String,
    /// Ingredient confidence or key of a key/value line.
    pub label: String,
    /// Step number (zero for other kinds).
    pub number: u32,
}

impl From<Block> for BlockView {
    fn from(block: Block) -> Self {
        let kind = block.kind();
        let (text, label, number) = match block {
            Block::Heading { text } | Block::Bullet { text } | Block::Paragraph { text } => {
                (text, String::new(), 0)
            }
            Block::Ingredient { name, confidence } => (name, confidence, 0),
            Block::Step { number, text } => (text, String::new(), number),
            Block::KeyValue { key, value } => (value, key, 0),
        };
        Self {
            kind,
            text,
            label,
            number,
        }
    }
}

/// Recipe page template.
#[derive(Template, WebTemplate)]
#[template(path = "recipes/show.html")]
pub struct RecipePageTemplate {
    pub title: String,
    /// Save date, e.g. "March 4, 2026".
    pub saved_on: String,
    pub image: Option<String>,
    pub blocks: Vec<BlockView>,
}

/// GET /recipes/{id}
///
/// # Errors
///
/// Returns 401 without a valid token and 404 if the user has no such recipe.
#[instrument(skip_all, fields(recipe_id = %id))]
pub async fn recipe(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<RecipeId>,
) -> Result<RecipePageTemplate> {
    let recipe = find_recipe(&state, user.id, id).await?;
    Ok(RecipePageTemplate {
        title: recipe.title(),
        saved_on: long_date(&recipe.created_at),
        blocks: mealmind_core::format_recipe(&recipe.recipe_text)
            .into_iter()
            .map(BlockView::from)
            .collect(),
        image: recipe.ingredients_image,
    })
}

fn long_date(at: &DateTime<Utc>) -> String {
    at.format("%B %-d, %Y").to_string()
}
