//! `.env` file sink.

use indexmap::IndexMap;
use std::path::{Path, PathBuf};

use super::terminal::write_atomic;
use crate::config::render_env_file;
use crate::error::Result;

/// Writes the activated variables to a `.env` file for tools that load one.
#[derive(Debug, Clone)]
pub struct DotEnvSink {
    path: PathBuf,
}

impl DotEnvSink {
    /// Create a sink writing to `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Where the file is written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the file with exactly `variables`.
    pub fn write(&self, variables: &IndexMap<String, String>) -> Result<()> {
        write_atomic(&self.path, &render_env_file(variables))?;
        tracing::debug!(
            "Wrote {} variables to {}",
            variables.len(),
            self.path.display()
        );
        Ok(())
    }
}
