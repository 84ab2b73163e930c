//! CLI subcommands.

pub mod format;
pub mod migrate;
