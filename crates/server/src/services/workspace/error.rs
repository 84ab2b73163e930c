//! Workspace error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::generator::GenerationError;

/// Errors that can occur during workspace operations.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// Generate was requested before an image was set.
    #[error("Please upload an image of your ingredients first")]
    NoImage,

    /// Another generation for the same user is still running.
    #[error("A recipe is already being generated")]
    Busy,

    /// Free generations used up without an active subscription.
    #[error("You have used all of your free recipe generations. Subscribe to keep cooking!")]
    PaymentRequired,

    /// The recipe to edit does not exist or belongs to someone else.
    #[error("recipe not found")]
    RecipeNotFound,

    /// Generation provider error.
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
