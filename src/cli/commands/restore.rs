//! Restore command implementation.
//!
//! The `envsel restore` command re-activates the environment this project
//! used last, without prompting. Shell startup hooks call it so a new
//! terminal picks up the previous choice.

use std::path::{Path, PathBuf};

use crate::cli::args::RestoreArgs;
use crate::error::{EnvselError, Result};
use crate::ui::UserInterface;

use super::context::ProjectContext;
use super::dispatcher::{Command, CommandResult};

/// The restore command implementation.
pub struct RestoreCommand {
    project_root: PathBuf,
    config: Option<PathBuf>,
    args: RestoreArgs,
}

impl RestoreCommand {
    /// Create a new restore command.
    pub fn new(project_root: &Path, config: Option<&Path>, args: RestoreArgs) -> Self {
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
    pub fn args(&self) -> &RestoreArgs {
        &self.args
    }
}

impl Command for RestoreCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let ctx = ProjectContext::load(&self.project_root, self.config.as_deref())?;
        let state = ctx.load_state()?;

        let Some(environment) = state.last_environment else {
            ui.message("No environment to restore.");
            return Ok(CommandResult::success());
        };

        let name = environment
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| environment.display().to_string());

        let session = ctx.session()?;
        let mut spinner = ui.start_spinner(&format!("Restoring {}", name));

        match session.activate(&environment) {
            Ok(outcome) => {
                spinner.finish_success(&format!(
                    "Restored {} ({} variables)",
                    name, outcome.variable_count
                ));
                for warning in &outcome.warnings {
                    ui.warning(warning);
                }
                Ok(CommandResult::success())
            }
            Err(e @ EnvselError::ActivationFailed { .. }) => {
                spinner.finish_error(&format!("Failed to restore {}", name));
                ui.error(&e.to_string());
                Ok(CommandResult::failure(1))
            }
            Err(e) => {
                spinner.finish_error(&format!("Failed to restore {}", name));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    fn setup_project(executable: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        let envsel_dir = temp.path().join(".envsel");
        fs::create_dir_all(&envsel_dir).unwrap();
        fs::write(
            envsel_dir.join("config.yml"),
            format!(
                "root_prefix: /opt/micromamba\nexecutable: {}\nstate_dir: state\nupdate_interpreter_setting: false\n",
                executable
            ),
        )
        .unwrap();
        temp
    }

    fn remember(temp: &TempDir, environment: &str) {
        let ctx = ProjectContext::load(temp.path(), None).unwrap();
        let mut state = ctx.load_state().unwrap();
        state.record_activation(Path::new(environment), 2);
        state.save_to(&ctx.state_file().unwrap()).unwrap();
    }

    #[test]
    fn restore_command_creation() {
        let temp = TempDir::new().unwrap();
        let cmd = RestoreCommand::new(temp.path(), None, RestoreArgs::default());

        assert_eq!(cmd.project_root(), temp.path());
        let _ = cmd.args();
    }

    #[test]
    fn nothing_to_restore() {
        let temp = setup_project("micromamba");
        let cmd = RestoreCommand::new(temp.path(), None, RestoreArgs::default());
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert!(result.success);
        assert!(ui.has_message("No environment to restore"));
        assert!(ui.spinners().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn restores_last_environment_without_prompting() {
        let temp = setup_project("echo");
        remember(&temp, "/opt/micromamba/envs/data");
        let cmd = RestoreCommand::new(temp.path(), None, RestoreArgs::default());
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert!(result.success);
        assert!(ui.prompts_shown().is_empty());
        let env_file = fs::read_to_string(temp.path().join(".env")).unwrap();
        assert!(env_file.contains("CONDA_DEFAULT_ENV=\"data\""));
    }

    #[cfg(unix)]
    #[test]
    fn restore_failure_exits_nonzero() {
        let temp = setup_project("false");
        remember(&temp, "/opt/micromamba/envs/data");
        let cmd = RestoreCommand::new(temp.path(), None, RestoreArgs::default());
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(ui.has_error("Failed to activate"));
        assert!(!temp.path().join(".env").exists());
    }
}
