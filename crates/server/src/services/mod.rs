//! Business logic services.
//!
//! # Services
//!
//! - `workspace` - Per-user recipe draft: image, generation, save, edit
//! - `paywall` - Free-tier generation limit

pub mod paywall;
pub mod workspace;

pub use paywall::Paywall;
pub use workspace::{
    RecipeWorkspace, View, Workspace, WorkspaceError, WorkspaceService, WorkspaceSnapshot,
    Workspaces,
};
