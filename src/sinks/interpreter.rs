//! Editor interpreter-path setting.
//!
//! Keeps `python.defaultInterpreterPath` in the project's
//! `.vscode/settings.json` pointing at the activated environment so the
//! editor's interpreter selection follows envsel. Every other key in the
//! file is preserved in its original order.

use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use super::terminal::write_atomic;
use crate::environment::PathNormalizer;
use crate::error::{EnvselError, Result};

/// Setting key updated on activation.
pub const INTERPRETER_SETTING_KEY: &str = "python.defaultInterpreterPath";

/// Placeholder the editor expands to the project directory.
pub const WORKSPACE_FOLDER: &str = "${workspaceFolder}";

/// Default settings file relative to the project root.
pub fn default_settings_file(project_root: &Path) -> PathBuf {
    project_root.join(".vscode").join("settings.json")
}

/// The interpreter executable inside an environment.
pub fn interpreter_path(environment: &Path) -> PathBuf {
    if cfg!(target_os = "windows") {
        environment.join("python.exe")
    } else {
        environment.join("bin").join("python")
    }
}

/// Writes the interpreter path of an environment into editor settings.
#[derive(Debug, Clone)]
pub struct InterpreterSetting {
    settings_file: PathBuf,
    project_root: PathBuf,
    normalizer: PathNormalizer,
}

impl InterpreterSetting {
    /// Create a setting writer for `settings_file`, relativizing paths under
    /// `project_root`.
    pub fn new(settings_file: PathBuf, project_root: PathBuf) -> Self {
        Self {
            settings_file,
            project_root,
            normalizer: PathNormalizer::native(),
        }
    }

    /// Use `normalizer` when deciding whether an interpreter is inside the
    /// project.
    pub fn with_normalizer(mut self, normalizer: PathNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Settings file that is updated.
    pub fn settings_file(&self) -> &Path {
        &self.settings_file
    }

    /// Value written for `environment`.
    ///
    /// Interpreters inside the project are written relative to
    /// `${workspaceFolder}` with forward slashes so the setting survives the
    /// project being moved or checked out elsewhere.
    ///
    /// # Example
    ///
    /// ```
    /// use envsel::sinks::InterpreterSetting;
    /// use std::path::{Path, PathBuf};
    ///
    /// let setting = InterpreterSetting::new(
    ///     PathBuf::from("/home/u/proj/.vscode/settings.json"),
    ///     PathBuf::from("/home/u/proj"),
    /// );
    /// # if cfg!(unix) {
    /// assert_eq!(
    ///     setting.setting_value(Path::new("/home/u/proj/.conda/envB")),
    ///     "${workspaceFolder}/.conda/envB/bin/python",
    /// );
    /// assert_eq!(
    ///     setting.setting_value(Path::new("/opt/micromamba/envs/envA")),
    ///     "/opt/micromamba/envs/envA/bin/python",
    /// );
    /// # }
    /// ```
    pub fn setting_value(&self, environment: &Path) -> String {
        let interpreter = interpreter_path(environment);
        match self.relative_to_project(&interpreter) {
            Some(parts) => format!("{}/{}", WORKSPACE_FOLDER, parts.join("/")),
            None => interpreter.to_string_lossy().to_string(),
        }
    }

    /// Components of `interpreter` below the project root, spelled as in
    /// `interpreter`.
    ///
    /// Both sides are compared after normalization, so a relative project
    /// root or a difference in letter case on a case-insensitive filesystem
    /// still counts as inside.
    fn relative_to_project(&self, interpreter: &Path) -> Option<Vec<String>> {
        let root = self.normalizer.normalize(&self.project_root);
        if !self.normalizer.normalize(interpreter).starts_with(&root) {
            return None;
        }

        let lexical = PathNormalizer::new(false);
        let depth = lexical.normalize(&self.project_root).components().count();
        let parts: Vec<String> = lexical
            .normalize(interpreter)
            .components()
            .skip(depth)
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().to_string()),
                _ => None,
            })
            .collect();

        (!parts.is_empty()).then_some(parts)
    }

    /// Point the setting at `environment`, creating the file if needed.
    ///
    /// # Errors
    ///
    /// Returns [`EnvselError::SettingsParseError`] if the existing file is
    /// not a JSON object. The file is left untouched in that case.
    pub fn update(&self, environment: &Path) -> Result<()> {
        let mut settings = self.read_settings()?;
        let value = self.setting_value(environment);
        settings.insert(
            INTERPRETER_SETTING_KEY.to_string(),
            Value::String(value.clone()),
        );

        let body = serde_json::to_string_pretty(&Value::Object(settings))
            .map_err(|e| EnvselError::Other(e.into()))?;
        write_atomic(&self.settings_file, &format!("{body}\n"))?;

        tracing::debug!(
            "Set {} to {} in {}",
            INTERPRETER_SETTING_KEY,
            value,
            self.settings_file.display()
        );
        Ok(())
    }

    fn read_settings(&self) -> Result<Map<String, Value>> {
        let content = match fs::read_to_string(&self.settings_file) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        let parse_error = |message: String| EnvselError::SettingsParseError {
            path: self.settings_file.clone(),
            message,
        };
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(parse_error("expected a JSON object".to_string())),
            Err(e) => Err(parse_error(e.to_string())),
        }
    }
}
