//! User settings discovery and loading.
//!
//! Settings are read from YAML files and merged field by field, later files
//! overriding earlier ones:
//! 1. User global settings (`~/.envsel/config.yml`)
//! 2. Project settings (`.envsel/config.yml`)
//! 3. Local overrides (`.envsel/config.local.yml`)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EnvselError, Result};

/// Name of the per-project and per-user settings directory.
pub const SETTINGS_DIR: &str = ".envsel";

/// Overrides the per-user envsel directory.
pub const HOME_VAR: &str = "ENVSEL_HOME";

/// Per-user envsel directory: `$ENVSEL_HOME`, else `~/.envsel`.
pub fn envsel_home() -> Option<PathBuf> {
    match std::env::var_os(HOME_VAR) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::home_dir().map(|home| home.join(SETTINGS_DIR)),
    }
}

/// Explicit user settings. Every field is optional; unset fields are
/// discovered from the shell or defaulted by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Directory under which the environment manager keeps global environments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_prefix: Option<PathBuf>,

    /// Path to the environment manager executable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,

    /// Registry file listing known environments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_file: Option<PathBuf>,

    /// Where the generated `.env` file is written (relative to the project).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_file: Option<PathBuf>,

    /// Where the terminal activation script is written (relative to the project).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_script: Option<PathBuf>,

    /// Whether to update the editor's interpreter path on activation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_interpreter_setting: Option<bool>,

    /// Directory holding per-project state (default `~/.envsel/projects`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
}

impl Settings {
    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: Settings) -> Settings {
        Settings {
            root_prefix: other.root_prefix.or(self.root_prefix),
            executable: other.executable.or(self.executable),
            registry_file: other.registry_file.or(self.registry_file),
            env_file: other.env_file.or(self.env_file),
            terminal_script: other.terminal_script.or(self.terminal_script),
            update_interpreter_setting: other
                .update_interpreter_setting
                .or(self.update_interpreter_setting),
            state_dir: other.state_dir.or(self.state_dir),
        }
    }

    /// Parse YAML content. `source_path` is only used for error reporting.
    pub fn parse(content: &str, source_path: &Path) -> Result<Settings> {
        if content.trim().is_empty() {
            return Ok(Settings::default());
        }

        serde_yaml::from_str(content).map_err(|e| EnvselError::SettingsParseError {
            path: source_path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load a single settings file.
    pub fn load_file(path: &Path) -> Result<Settings> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// The root prefix with empty values and a leading `~` resolved.
    pub fn root_prefix(&self) -> Option<PathBuf> {
        non_empty(self.root_prefix.as_deref()).map(expand_home)
    }

    /// The executable with empty values and a leading `~` resolved.
    pub fn executable(&self) -> Option<PathBuf> {
        non_empty(self.executable.as_deref()).map(expand_home)
    }

    /// The registry file with empty values and a leading `~` resolved.
    pub fn registry_file(&self) -> Option<PathBuf> {
        non_empty(self.registry_file.as_deref()).map(expand_home)
    }

    /// The state directory with empty values and a leading `~` resolved.
    pub fn state_dir(&self) -> Option<PathBuf> {
        non_empty(self.state_dir.as_deref()).map(expand_home)
    }
}

/// Paths to settings files in priority order (later overrides earlier).
#[derive(Debug, Clone)]
pub struct SettingsPaths {
    /// User's global settings: ~/.envsel/config.yml (or $ENVSEL_HOME/config.yml)
    pub user_global: Option<PathBuf>,

    /// Project settings: .envsel/config.yml
    pub project: Option<PathBuf>,

    /// Local overrides: .envsel/config.local.yml
    pub project_local: Option<PathBuf>,
}

impl SettingsPaths {
    /// Discover settings files for the given project root.
    pub fn discover(project_root: &Path) -> Self {
        Self {
            user_global: Self::find_user_global(),
            project: existing(project_root.join(SETTINGS_DIR).join("config.yml")),
            project_local: existing(project_root.join(SETTINGS_DIR).join("config.local.yml")),
        }
    }

    fn find_user_global() -> Option<PathBuf> {
        existing(envsel_home()?.join("config.yml"))
    }

    /// Returns all existing settings paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        [&self.user_global, &self.project, &self.project_local]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Load and merge all settings for a project.
///
/// When `explicit` is given it replaces the project files; the user global
/// file still applies underneath it.
pub fn load_settings(project_root: &Path, explicit: Option<&Path>) -> Result<Settings> {
    let mut paths = SettingsPaths::discover(project_root);
    if let Some(path) = explicit {
        paths.project = Some(path.to_path_buf());
        paths.project_local = None;
    }

    let mut settings = Settings::default();
    for path in paths.all_existing() {
        tracing::debug!("Loading settings from {}", path.display());
        settings = settings.merge(Settings::load_file(path)?);
    }

    Ok(settings)
}

/// Replace a leading `~` with the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

fn non_empty(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| !p.as_os_str().is_empty())
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    if path.exists() {
        Some(path)
    } else {
        None
    }
}
