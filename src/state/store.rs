//! Persistent state storage.
//!
//! Each project has a state file under the per-user envsel directory
//! recording which environment was last activated, so the next session can
//! restore it without prompting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::ProjectId;
use crate::config::envsel_home;
use crate::error::{EnvselError, Result};

/// Persistent state for a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateStore {
    /// Schema version for migration.
    pub version: u32,

    /// Project identification.
    pub project: ProjectInfo,

    /// Environment activated most recently.
    #[serde(default)]
    pub last_environment: Option<PathBuf>,

    /// When it was activated.
    #[serde(default)]
    pub last_activated: Option<DateTime<Utc>>,

    /// Recent activations (most recent first).
    #[serde(default)]
    pub history: Vec<ActivationRecord>,
}

/// Project information stored in state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub path: String,
    pub name: String,
}

/// One successful activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationRecord {
    pub environment: PathBuf,
    pub timestamp: DateTime<Utc>,
    pub variable_count: usize,
}

impl StateStore {
    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Number of activations kept in history.
    pub const HISTORY_RETENTION: usize = 20;

    /// Create a new state store for a project.
    pub fn new(project_id: &ProjectId) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            project: ProjectInfo {
                path: project_id.path().to_string_lossy().to_string(),
                name: project_id.name().to_string(),
            },
            last_environment: None,
            last_activated: None,
            history: Vec::new(),
        }
    }

    /// Directory holding every project's state: `~/.envsel/projects`.
    ///
    /// # Errors
    ///
    /// Returns [`EnvselError::StateError`] when neither `$ENVSEL_HOME` nor a
    /// home directory is available.
    pub fn default_root() -> Result<PathBuf> {
        projects_root(envsel_home())
    }

    /// Get the state file path.
    pub fn state_file(project_id: &ProjectId) -> Result<PathBuf> {
        Ok(Self::state_file_in(&Self::default_root()?, project_id))
    }

    /// Get the state file path under an explicit state root.
    pub fn state_file_in(root: &Path, project_id: &ProjectId) -> PathBuf {
        root.join(project_id.hash()).join("state.yml")
    }

    /// Load state from an explicit file. Returns `None` if it does not exist.
    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        let state: Self = serde_yaml::from_str(&content).map_err(|e| EnvselError::StateError {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })?;

        Ok(Some(state))
    }

    /// Save state to an explicit file using an atomic write.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = serde_yaml::to_string(self).map_err(|e| EnvselError::StateError {
            message: format!("Failed to serialize state: {}", e),
        })?;

        let temp_path = path.with_extension("yml.tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Record a successful activation.
    pub fn record_activation(&mut self, environment: &Path, variable_count: usize) {
        let timestamp = Utc::now();
        self.last_environment = Some(environment.to_path_buf());
        self.last_activated = Some(timestamp);
        self.history.insert(
            0,
            ActivationRecord {
                environment: environment.to_path_buf(),
                timestamp,
                variable_count,
            },
        );
        self.history.truncate(Self::HISTORY_RETENTION);
    }

    /// Forget the last activated environment.
    pub fn clear(&mut self) {
        self.last_environment = None;
        self.last_activated = None;
    }
}

fn projects_root(envsel_home: Option<PathBuf>) -> Result<PathBuf> {
    envsel_home
        .map(|home| home.join("projects"))
        .ok_or_else(|| EnvselError::StateError {
            message: format!(
                "Cannot locate the home directory; set {} or state_dir",
                crate::config::HOME_VAR
            ),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(temp: &TempDir) -> ProjectId {
        ProjectId::from_path(temp.path()).unwrap()
    }

    #[test]
    fn new_state_is_empty() {
        let temp = TempDir::new().unwrap();
        let state = StateStore::new(&project(&temp));

        assert_eq!(state.version, StateStore::CURRENT_VERSION);
        assert!(state.last_environment.is_none());
        assert!(state.last_activated.is_none());
        assert!(state.history.is_empty());
    }

    #[test]
    fn record_activation_sets_last_environment() {
        let temp = TempDir::new().unwrap();
        let mut state = StateStore::new(&project(&temp));

        state.record_activation(Path::new("/opt/envs/a"), 12);
        state.record_activation(Path::new("/opt/envs/b"), 7);

        assert_eq!(state.last_environment, Some(PathBuf::from("/opt/envs/b")));
        assert!(state.last_activated.is_some());
        assert_eq!(state.history.len(), 2);
        assert_eq!(state.history[0].environment, PathBuf::from("/opt/envs/b"));
        assert_eq!(state.history[1].variable_count, 12);
    }

    #[test]
    fn history_is_bounded() {
        let temp = TempDir::new().unwrap();
        let mut state = StateStore::new(&project(&temp));

        for i in 0..(StateStore::HISTORY_RETENTION + 5) {
            state.record_activation(&PathBuf::from(format!("/opt/envs/{i}")), i);
        }

        assert_eq!(state.history.len(), StateStore::HISTORY_RETENTION);
    }

    #[test]
    fn save_and_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("projects").join("abc").join("state.yml");
        let mut state = StateStore::new(&project(&temp));
        state.record_activation(Path::new("/opt/envs/data"), 3);

        state.save_to(&path).unwrap();
        let loaded = StateStore::load_from(&path).unwrap().unwrap();

        assert_eq!(loaded, state);
        assert!(!path.with_extension("yml.tmp").exists());
    }

    #[test]
    fn load_from_missing_file_is_none() {
        let temp = TempDir::new().unwrap();
        let loaded = StateStore::load_from(&temp.path().join("state.yml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn corrupt_state_is_state_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.yml");
        fs::write(&path, "version: [not a number").unwrap();

        assert!(matches!(
            StateStore::load_from(&path),
            Err(EnvselError::StateError { .. })
        ));
    }

    #[test]
    fn clear_forgets_last_environment() {
        let temp = TempDir::new().unwrap();
        let mut state = StateStore::new(&project(&temp));
        state.record_activation(Path::new("/opt/envs/a"), 1);

        state.clear();

        assert!(state.last_environment.is_none());
        assert_eq!(state.history.len(), 1);
    }

    #[test]
    fn state_file_in_uses_explicit_root() {
        let temp = TempDir::new().unwrap();
        let id = project(&temp);

        let file = StateStore::state_file_in(Path::new("/var/envsel"), &id);

        assert_eq!(
            file,
            PathBuf::from("/var/envsel").join(id.hash()).join("state.yml")
        );
    }

    #[test]
    fn state_file_is_under_project_hash() {
        let temp = TempDir::new().unwrap();
        let id = project(&temp);
        let root = projects_root(Some(PathBuf::from("/u/.envsel"))).unwrap();

        let file = StateStore::state_file_in(&root, &id);

        assert!(file.ends_with(format!("projects/{}/state.yml", id.hash())));
        assert!(file.starts_with("/u/.envsel"));
    }

    #[test]
    fn missing_home_is_state_error() {
        let result = projects_root(None);

        match result {
            Err(EnvselError::StateError { message }) => {
                assert!(message.contains("ENVSEL_HOME"));
            }
            other => panic!("Expected StateError, got {:?}", other),
        }
    }
}
