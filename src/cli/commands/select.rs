//! Select command implementation.
//!
//! The `envsel select` command (and bare `envsel`) lists the registry,
//! lets the user pick an environment, and activates it everywhere.

use std::path::{Path, PathBuf};

use crate::cli::args::SelectArgs;
use crate::environment::Classification;
use crate::error::{EnvselError, Result};
use crate::ui::{Prompt, UserInterface};

use super::context::ProjectContext;
use super::dispatcher::{Command, CommandResult};
use super::display::{self, find_entry, picker_options};

/// Prompt key for the environment picker.
pub const ENVIRONMENT_PROMPT_KEY: &str = "environment";

/// The select command implementation.
pub struct SelectCommand {
    project_root: PathBuf,
    config: Option<PathBuf>,
    args: SelectArgs,
}

impl SelectCommand {
    /// Create a new select command.
    pub fn new(project_root: &Path, config: Option<&Path>, args: SelectArgs) -> Self {
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
    pub fn args(&self) -> &SelectArgs {
        &self.args
    }

    fn choose(&self, classification: &Classification, ui: &mut dyn UserInterface) -> Result<String> {
        if let Some(environment) = &self.args.environment {
            return Ok(environment.clone());
        }

        let theme = display::theme();
        let prompt = Prompt {
            key: ENVIRONMENT_PROMPT_KEY.to_string(),
            question: "Select an environment".to_string(),
            options: picker_options(&theme, classification),
            default: classification
                .active
                .as_ref()
                .map(|e| e.path.to_string_lossy().to_string()),
        };

        ui.prompt(&prompt)
    }
}

impl Command for SelectCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let ctx = ProjectContext::load(&self.project_root, self.config.as_deref())?;

        let classification = match ctx.classify() {
            Ok(c) => c,
            Err(e @ EnvselError::RegistryNotFound { .. }) => {
                display::show_registry_error(ui, &e);
                return Ok(CommandResult::failure(1));
            }
            Err(e) => return Err(e),
        };

        if classification.is_empty() {
            ui.message(&format!(
                "No environments found in {}",
                ctx.configuration().registry_file.display()
            ));
            return Ok(CommandResult::success());
        }

        let answer = self.choose(&classification, ui)?;
        let Some(entry) = find_entry(&classification, &answer) else {
            ui.error(&format!("Unknown environment: {}", answer));
            ui.show_hint("Run 'envsel list' to see the environments in the registry.");
            return Ok(CommandResult::failure(1));
        };

        let session = ctx.session()?;
        let mut spinner = ui.start_spinner(&format!("Activating {}", entry.display_name));

        match session.activate(&entry.path) {
            Ok(outcome) => {
                spinner.finish_success(&format!(
                    "Activated {} ({} variables)",
                    entry.display_name, outcome.variable_count
                ));
                for warning in &outcome.warnings {
                    ui.warning(warning);
                }
                let source = session.with_terminal(|t| t.source_command())?;
                ui.show_hint(&format!("Load it in this shell with: {}", source));
                Ok(CommandResult::success())
            }
            Err(e @ EnvselError::ActivationFailed { .. }) => {
                spinner.finish_error(&format!("Failed to activate {}", entry.display_name));
                ui.error(&e.to_string());
                Ok(CommandResult::failure(1))
            }
            Err(e) => {
                spinner.finish_error(&format!("Failed to activate {}", entry.display_name));
                Err(e)
            }
        }
    }
}
