//! Error types for envsel operations.
//!
//! This module defines [`EnvselError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `EnvselError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `EnvselError::Other`) for unexpected errors
//! - Shell discovery and `.env` write failures are logged, never returned
//!   to the user as fatal errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for envsel operations.
#[derive(Debug, Error)]
pub enum EnvselError {
    /// The environment registry file does not exist.
    #[error("Environment registry not found: {path}")]
    RegistryNotFound { path: PathBuf },

    /// The environment manager failed to produce the variables of an environment.
    #[error("Failed to activate {path}: {message}")]
    ActivationFailed { path: PathBuf, message: String },

    /// Another activation is still running in this session.
    #[error("An activation is already in progress")]
    ActivationInProgress,

    /// Discovering settings from the user's shell failed.
    #[error("Shell discovery failed: {message}")]
    ConfigDiscoveryFailed { message: String },

    /// Failed to parse a settings file.
    #[error("Failed to parse settings at {path}: {message}")]
    SettingsParseError { path: PathBuf, message: String },

    /// Reading or writing persisted project state failed.
    #[error("State error: {message}")]
    StateError { message: String },

    /// Shell command failed to start.
    #[error("Failed to run {command}: {message}")]
    CommandFailed { command: String, message: String },

    /// A prompt could not be answered.
    #[error("Cannot prompt for '{key}': {message}")]
    PromptUnavailable { key: String, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for envsel operations.
pub type Result<T> = std::result::Result<T, EnvselError>;
