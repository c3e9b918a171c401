//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. Every command that touches a
//! project builds a [`ProjectContext`] first so settings, discovery, and
//! derived paths are resolved the same way everywhere.

pub mod completions;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod display;
pub mod list;
pub mod restore;
pub mod select;
pub mod status;

pub use context::ProjectContext;
pub use dispatcher::{Command, CommandDispatcher, CommandResult};
