//! Environment discovery, classification, and activation.
//!
//! The pipeline for one selection is:
//!
//! 1. [`EnvironmentCatalog`] reads the registry file
//! 2. [`EnvironmentClassifier`] groups entries into workspace, global, and other
//! 3. [`EnvironmentActivator`] asks the environment manager for the chosen
//!    environment's variables

pub mod activator;
pub mod catalog;
pub mod classifier;

pub use activator::{
    apply_defaults, dump_command, parse_variables, ActivationResult, EnvironmentActivator,
    EnvironmentRunner, ManagerRunner, DEFAULT_ENV_NAME_VAR, PREFIX_VAR,
};
pub use catalog::EnvironmentCatalog;
pub use classifier::{
    Classification, EnvironmentClassifier, EnvironmentEntry, EnvironmentGroup, PathNormalizer,
};
