//! Registry file parsing.
//!
//! The registry (`~/.conda/environments.txt` by default) lists one
//! environment directory per line. Entries are returned in file order and
//! are not checked against the filesystem.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{EnvselError, Result};

/// Reads environment paths from a registry file.
pub struct EnvironmentCatalog;

impl EnvironmentCatalog {
    /// List the environment paths recorded in `registry_file`.
    ///
    /// # Errors
    ///
    /// Returns [`EnvselError::RegistryNotFound`] if the file does not exist.
    pub fn list(registry_file: &Path) -> Result<Vec<String>> {
        let content = fs::read_to_string(registry_file).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                EnvselError::RegistryNotFound {
                    path: registry_file.to_path_buf(),
                }
            } else {
                EnvselError::Io(e)
            }
        })?;

        let entries = Self::parse(&content);
        tracing::debug!(
            "Read {} environments from {}",
            entries.len(),
            registry_file.display()
        );
        Ok(entries)
    }

    /// Split registry content on any run of CR/LF, dropping blank lines.
    ///
    /// # Example
    ///
    /// ```
    /// use envsel::environment::EnvironmentCatalog;
    ///
    /// let entries = EnvironmentCatalog::parse("/opt/envs/a\r\n\r\n/opt/envs/b\n");
    /// assert_eq!(entries, vec!["/opt/envs/a", "/opt/envs/b"]);
    /// ```
    pub fn parse(content: &str) -> Vec<String> {
        content
            .split(['\r', '\n'])
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect()
    }
}
