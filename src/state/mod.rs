//! Persisted per-project state.
//!
//! Tracks the last activated environment of each project so it can be
//! restored at startup.

pub mod project;
pub mod store;

pub use project::ProjectId;
pub use store::{ActivationRecord, ProjectInfo, StateStore};
