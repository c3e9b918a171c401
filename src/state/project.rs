//! Project identification and hashing.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Unique identifier for a project.
///
/// Projects are identified by their canonical path. The hash is stable
/// across runs and is used as the project's state directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectId {
    /// First 8 bytes of the path's SHA256, hex encoded.
    hash: String,
    /// Canonical path to the project root.
    path: PathBuf,
}

impl ProjectId {
    /// Create a ProjectId from a project path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be canonicalized (e.g., doesn't exist).
    pub fn from_path(path: &Path) -> Result<Self> {
        let abs_path = path.canonicalize()?;
        let hash = Self::compute_hash(&abs_path);

        Ok(Self {
            hash,
            path: abs_path,
        })
    }

    /// Get the hash as a string.
    ///
    /// This is a 16-character hex string (8 bytes of SHA256).
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Get the project path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the project name (directory name).
    pub fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
    }

    fn compute_hash(path: &Path) -> String {
        let mut hasher = Sha256::new();
        hasher.update(path.to_string_lossy().as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..8])
    }
}
