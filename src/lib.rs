//! envsel - Pick a conda/micromamba environment for a project and apply it.
//!
//! envsel reads the environment manager's registry, groups the known
//! environments into those inside the project, those under the manager's
//! root prefix, and everything else, then activates the one the user picks:
//! its variables go to a terminal activation script, a `.env` file, and the
//! editor's interpreter setting, and the choice is remembered per project.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Settings loading and configuration discovery
//! - [`environment`] - Registry reading, classification, and activation
//! - [`error`] - Error types and result aliases
//! - [`runner`] - Activation sessions applying results to every destination
//! - [`shell`] - Subprocess execution and platform helpers
//! - [`sinks`] - Terminal script, `.env`, and interpreter setting writers
//! - [`state`] - Per-project memory of the last activated environment
//! - [`ui`] - Interactive prompts, spinners, and terminal output
//!
//! # Example
//!
//! ```
//! use envsel::environment::{EnvironmentCatalog, EnvironmentClassifier, PathNormalizer};
//! use std::path::Path;
//!
//! let entries = EnvironmentCatalog::parse("/opt/micromamba/envs/data\n\n/srv/envs/tools\n");
//! let classification = EnvironmentClassifier::new(PathNormalizer::new(false)).classify(
//!     &entries,
//!     Some(Path::new("/home/u/proj")),
//!     Some(Path::new("/opt/micromamba")),
//!     None,
//! );
//! assert_eq!(classification.global[0].display_name, "data");
//! assert_eq!(classification.other[0].display_name, "tools");
//! ```

pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod runner;
pub mod shell;
pub mod sinks;
pub mod state;
pub mod ui;

pub use error::{EnvselError, Result};
