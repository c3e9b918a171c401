//! Config command implementation.
//!
//! The `envsel config` command shows the resolved configuration and where
//! activation results are written.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cli::args::ConfigArgs;
use crate::config::{Configuration, SettingsPaths};
use crate::error::{EnvselError, Result};
use crate::ui::UserInterface;

use super::context::ProjectContext;
use super::dispatcher::{Command, CommandResult};

/// The config command implementation.
pub struct ConfigCommand {
    project_root: PathBuf,
    config: Option<PathBuf>,
    args: ConfigArgs,
}

#[derive(Serialize)]
struct ConfigOutput<'a> {
    #[serde(flatten)]
    configuration: &'a Configuration,
    env_file: PathBuf,
    terminal_script: PathBuf,
    interpreter_settings_file: Option<PathBuf>,
    state_file: PathBuf,
}

impl ConfigCommand {
    /// Create a new config command.
    pub fn new(project_root: &Path, config: Option<&Path>, args: ConfigArgs) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            config: config.map(Path::to_path_buf),
            args,
        }
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get the command arguments.
    pub fn args(&self) -> &ConfigArgs {
        &self.args
    }
}

impl Command for ConfigCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let ctx = ProjectContext::load(&self.project_root, self.config.as_deref())?;

        // Show settings file path(s)
        let mut paths = SettingsPaths::discover(&self.project_root);
        if let Some(explicit) = &self.config {
            paths.project = Some(explicit.clone());
            paths.project_local = None;
        }
        let existing = paths.all_existing();
        if !existing.is_empty() {
            for path in &existing {
                ui.message(&format!("# {}", path.display()));
            }
            ui.message("");
        }

        let output = ConfigOutput {
            configuration: ctx.configuration(),
            env_file: ctx.env_file_path(),
            terminal_script: ctx.terminal_script_path(),
            interpreter_settings_file: ctx.interpreter_settings_file(),
            state_file: ctx.state_file()?,
        };

        if self.args.json {
            let json =
                serde_json::to_string_pretty(&output).map_err(|e| EnvselError::Other(e.into()))?;
            ui.message(&json);
        } else {
            let yaml = serde_yaml::to_string(&output).map_err(|e| EnvselError::Other(e.into()))?;
            ui.message(&yaml);
        }

        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    fn setup_project(config: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        let envsel_dir = temp.path().join(".envsel");
        fs::create_dir_all(&envsel_dir).unwrap();
        fs::write(envsel_dir.join("config.yml"), config).unwrap();
        temp
    }

    #[test]
    fn config_command_creation() {
        let temp = TempDir::new().unwrap();
        let cmd = ConfigCommand::new(temp.path(), None, ConfigArgs::default());

        assert_eq!(cmd.project_root(), temp.path());
        assert!(!cmd.args().json);
    }

    #[test]
    fn config_shows_settings_path_and_values() {
        let temp = setup_project(
            "root_prefix: /opt/micromamba\nexecutable: /usr/bin/micromamba\nstate_dir: state\n",
        );
        let cmd = ConfigCommand::new(temp.path(), None, ConfigArgs::default());
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert!(result.success);
        assert!(ui.has_message("# "));
        assert!(ui.has_message("config.yml"));
        assert!(ui.has_message("executable: /usr/bin/micromamba"));
        assert!(ui.has_message("env_file:"));
    }

    #[test]
    fn config_json_output() {
        let temp = setup_project(
            "root_prefix: /opt/micromamba\nexecutable: micromamba\nstate_dir: state\nupdate_interpreter_setting: false\n",
        );
        let cmd = ConfigCommand::new(temp.path(), None, ConfigArgs { json: true });
        let mut ui = MockUI::new();

        cmd.execute(&mut ui).unwrap();

        let json_text = ui.messages().last().unwrap();
        let json: serde_json::Value = serde_json::from_str(json_text).unwrap();
        assert_eq!(json["root_prefix"], "/opt/micromamba");
        assert_eq!(json["executable"], "micromamba");
        assert!(json["interpreter_settings_file"].is_null());
        assert!(json["env_file"].as_str().unwrap().ends_with(".env"));
    }

    #[test]
    fn explicit_config_file_is_listed() {
        let temp = TempDir::new().unwrap();
        let explicit = temp.path().join("custom.yml");
        fs::write(
            &explicit,
            "root_prefix: /opt/conda\nexecutable: conda\nstate_dir: state\n",
        )
        .unwrap();
        let cmd = ConfigCommand::new(temp.path(), Some(&explicit), ConfigArgs::default());
        let mut ui = MockUI::new();

        cmd.execute(&mut ui).unwrap();

        assert!(ui.has_message("custom.yml"));
        assert!(ui.has_message("executable: conda"));
    }

    #[test]
    fn invalid_settings_is_an_error() {
        let temp = setup_project("unknown_key: 1\n");
        let cmd = ConfigCommand::new(temp.path(), None, ConfigArgs::default());
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui);

        assert!(matches!(result, Err(EnvselError::SettingsParseError { .. })));
    }
}
