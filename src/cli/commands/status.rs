//! Status command implementation.
//!
//! The `envsel status` command shows which environment this project last
//! activated and the recent activation history.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cli::args::StatusArgs;
use crate::error::{EnvselError, Result};
use crate::state::ActivationRecord;
use crate::ui::UserInterface;

use super::context::ProjectContext;
use super::dispatcher::{Command, CommandResult};

/// Number of history entries shown in human output.
const RECENT_LIMIT: usize = 5;

/// The status command implementation.
pub struct StatusCommand {
    project_root: PathBuf,
    config: Option<PathBuf>,
    args: StatusArgs,
}

#[derive(Serialize)]
struct StatusOutput<'a> {
    project: &'a Path,
    state_file: &'a Path,
    last_environment: Option<&'a Path>,
    last_activated: Option<String>,
    history: &'a [ActivationRecord],
}

impl StatusCommand {
    /// Create a new status command.
    pub fn new(project_root: &Path, config: Option<&Path>, args: StatusArgs) -> Self {
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
    pub fn args(&self) -> &StatusArgs {
        &self.args
    }
}

impl Command for StatusCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let ctx = ProjectContext::load(&self.project_root, self.config.as_deref())?;
        let state_file = ctx.state_file()?;
        let state = ctx.load_state()?;

        if self.args.json {
            let output = StatusOutput {
                project: ctx.project_root(),
                state_file: &state_file,
                last_environment: state.last_environment.as_deref(),
                last_activated: state.last_activated.map(|t| t.to_rfc3339()),
                history: &state.history,
            };
            let json =
                serde_json::to_string_pretty(&output).map_err(|e| EnvselError::Other(e.into()))?;
            ui.message(&json);
            return Ok(CommandResult::success());
        }

        ui.show_header(&format!("{} - Status", state.project.name));

        let Some(environment) = &state.last_environment else {
            ui.message("No environment activated yet.");
            ui.show_hint("Run 'envsel select' to pick one.");
            return Ok(CommandResult::success());
        };

        ui.message(&format!("Environment: {}", environment.display()));
        if let Some(when) = state.last_activated {
            ui.message(&format!("Activated:   {}", when.format("%Y-%m-%d %H:%M")));
        }

        if state.history.len() > 1 {
            ui.message("");
            ui.message("Recent:");
            for record in state.history.iter().take(RECENT_LIMIT) {
                ui.message(&format!(
                    "  {}  {} ({} variables)",
                    record.timestamp.format("%Y-%m-%d %H:%M"),
                    record.environment.display(),
                    record.variable_count
                ));
            }
        }

        Ok(CommandResult::success())
    }
}
