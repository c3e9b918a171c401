//! List command implementation.
//!
//! The `envsel list` command shows the registry grouped by location.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cli::args::ListArgs;
use crate::environment::{Classification, EnvironmentGroup};
use crate::error::{EnvselError, Result};
use crate::ui::UserInterface;

use super::context::ProjectContext;
use super::dispatcher::{Command, CommandResult};
use super::display;

/// The list command implementation.
pub struct ListCommand {
    project_root: PathBuf,
    config: Option<PathBuf>,
    args: ListArgs,
}

#[derive(Serialize)]
struct ListOutput<'a> {
    registry_file: &'a Path,
    #[serde(flatten)]
    classification: &'a Classification,
}

impl ListCommand {
    /// Create a new list command.
    pub fn new(project_root: &Path, config: Option<&Path>, args: ListArgs) -> Self {
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
    pub fn args(&self) -> &ListArgs {
        &self.args
    }
}

impl Command for ListCommand {
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
        let registry_file = &ctx.configuration().registry_file;

        if self.args.json {
            let output = ListOutput {
                registry_file,
                classification: &classification,
            };
            let json =
                serde_json::to_string_pretty(&output).map_err(|e| EnvselError::Other(e.into()))?;
            ui.message(&json);
            return Ok(CommandResult::success());
        }

        if classification.is_empty() {
            ui.message(&format!(
                "No environments found in {}",
                registry_file.display()
            ));
            return Ok(CommandResult::success());
        }

        let theme = display::theme();
        let groups = [
            (EnvironmentGroup::Workspace, &classification.workspace),
            (EnvironmentGroup::Global, &classification.global),
            (EnvironmentGroup::Other, &classification.other),
        ];

        let mut first = true;
        for (group, entries) in groups {
            if entries.is_empty() {
                continue;
            }
            if !first {
                ui.message("");
            }
            first = false;

            ui.message(&format!(
                "  {}",
                theme.key.apply_to(format!("{}:", display::group_title(group)))
            ));
            for entry in entries {
                let line = display::environment_line(
                    &theme,
                    group,
                    entry,
                    classification.is_active(entry),
                );
                ui.message(&format!("    {}", line));
            }
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

    fn write_project(temp: &TempDir, entries: &[String]) {
        let registry = temp.path().join("environments.txt");
        fs::write(&registry, entries.join("\n")).unwrap();

        let envsel_dir = temp.path().join(".envsel");
        fs::create_dir_all(&envsel_dir).unwrap();
        fs::write(
            envsel_dir.join("config.yml"),
            format!(
                "root_prefix: /opt/micromamba\nexecutable: micromamba\nregistry_file: {}\nstate_dir: state\n",
                registry.display()
            ),
        )
        .unwrap();
    }

    fn setup_project(entries: &[String]) -> TempDir {
        let temp = TempDir::new().unwrap();
        write_project(&temp, entries);
        temp
    }

    #[test]
    fn list_command_creation() {
        let temp = TempDir::new().unwrap();
        let cmd = ListCommand::new(temp.path(), None, ListArgs::default());

        assert_eq!(cmd.project_root(), temp.path());
        assert!(!cmd.args().json);
    }

    #[test]
    fn list_groups_environments() {
        let temp = TempDir::new().unwrap();
        let local = temp.path().join(".conda").join("local");
        write_project(
            &temp,
            &[
                local.to_string_lossy().to_string(),
                "/opt/micromamba/envs/data".to_string(),
                "/srv/envs/tools".to_string(),
            ],
        );
        let cmd = ListCommand::new(temp.path(), None, ListArgs::default());
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert!(result.success);
        assert!(ui.has_message("Workspace environments:"));
        assert!(ui.has_message("Global environments:"));
        assert!(ui.has_message("Other environments:"));
        assert!(ui.has_message("local"));
        assert!(ui.has_message("tools"));
    }

    #[test]
    fn list_skips_empty_groups() {
        let temp = setup_project(&["/opt/micromamba/envs/data".to_string()]);
        let cmd = ListCommand::new(temp.path(), None, ListArgs::default());
        let mut ui = MockUI::new();

        cmd.execute(&mut ui).unwrap();

        assert!(ui.has_message("Global environments:"));
        assert!(!ui.has_message("Workspace environments:"));
        assert!(!ui.has_message("Other environments:"));
    }

    #[test]
    fn list_json_output() {
        let temp = setup_project(&[
            "/opt/micromamba/envs/data".to_string(),
            "/srv/envs/tools".to_string(),
        ]);
        let cmd = ListCommand::new(temp.path(), None, ListArgs { json: true });
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert!(result.success);
        let json: serde_json::Value = serde_json::from_str(&ui.messages()[0]).unwrap();
        assert_eq!(json["global"][0]["display_name"], "data");
        assert_eq!(json["other"][0]["path"], "/srv/envs/tools");
        assert!(json["workspace"].as_array().unwrap().is_empty());
        assert!(json["active"].is_null());
        assert!(json["registry_file"]
            .as_str()
            .unwrap()
            .ends_with("environments.txt"));
    }

    #[test]
    fn list_empty_registry() {
        let temp = setup_project(&[]);
        let cmd = ListCommand::new(temp.path(), None, ListArgs::default());
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert!(result.success);
        assert!(ui.has_message("No environments found"));
    }

    #[test]
    fn list_missing_registry_fails() {
        let temp = setup_project(&[]);
        fs::remove_file(temp.path().join("environments.txt")).unwrap();
        let cmd = ListCommand::new(temp.path(), None, ListArgs::default());
        let mut ui = MockUI::new();

        let result = cmd.execute(&mut ui).unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(ui.has_error("registry not found"));
    }
}
