//! Environment activation.
//!
//! Activation asks the environment manager to run a variable dump inside the
//! chosen environment (`micromamba run -p <path> env`) and turns the output
//! into an ordered variable map. Nothing is written anywhere here; callers
//! apply the [`ActivationResult`] to their sinks only after it succeeds.

use indexmap::IndexMap;
use std::path::{Path, PathBuf};

use crate::error::{EnvselError, Result};
use crate::shell::{self, CommandOptions};

/// Variable naming the active environment, read by prompt integrations.
pub const DEFAULT_ENV_NAME_VAR: &str = "CONDA_DEFAULT_ENV";

/// Variable holding the active environment's directory.
pub const PREFIX_VAR: &str = "CONDA_PREFIX";

/// Variables of an activated environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationResult {
    /// Every variable the environment defines, in manager output order.
    pub variables: IndexMap<String, String>,

    /// The environment that was activated.
    pub environment_path: PathBuf,
}

/// Runs the variable dump for an environment and returns its stdout.
pub trait EnvironmentRunner {
    /// Print the full environment of `environment` as `NAME=value` lines.
    ///
    /// # Errors
    ///
    /// Returns [`EnvselError::ActivationFailed`] if the manager cannot be
    /// started or exits unsuccessfully.
    fn dump_environment(&self, executable: &Path, environment: &Path) -> Result<String>;
}

/// Command run inside the environment to print its variables.
pub fn dump_command() -> Vec<String> {
    if cfg!(target_os = "windows") {
        vec!["cmd".to_string(), "/c".to_string(), "set".to_string()]
    } else {
        vec!["env".to_string()]
    }
}

/// Runs the real environment manager as a subprocess.
#[derive(Debug, Clone, Default)]
pub struct ManagerRunner;

impl EnvironmentRunner for ManagerRunner {
    fn dump_environment(&self, executable: &Path, environment: &Path) -> Result<String> {
        let program = executable.to_string_lossy().to_string();
        let mut args = vec![
            "run".to_string(),
            "-p".to_string(),
            environment.to_string_lossy().to_string(),
        ];
        args.extend(dump_command());

        let result = shell::execute(&program, &args, &CommandOptions::default()).map_err(|e| {
            let message = match e {
                EnvselError::CommandFailed { message, .. } => {
                    format!("could not start {}: {}", program, message)
                }
                other => other.to_string(),
            };
            EnvselError::ActivationFailed {
                path: environment.to_path_buf(),
                message,
            }
        })?;

        if !result.success {
            let stderr = result.stderr.trim();
            let message = if stderr.is_empty() {
                format!("{} exited with code {:?}", program, result.exit_code)
            } else {
                stderr.to_string()
            };
            return Err(EnvselError::ActivationFailed {
                path: environment.to_path_buf(),
                message,
            });
        }

        Ok(result.stdout)
    }
}

/// Computes the variables of a chosen environment.
pub struct EnvironmentActivator<R: EnvironmentRunner = ManagerRunner> {
    executable: PathBuf,
    runner: R,
}

impl EnvironmentActivator<ManagerRunner> {
    /// Create an activator that runs `executable` as a subprocess.
    pub fn new(executable: PathBuf) -> Self {
        Self::with_runner(executable, ManagerRunner)
    }
}

impl<R: EnvironmentRunner> EnvironmentActivator<R> {
    /// Create an activator with a custom runner.
    pub fn with_runner(executable: PathBuf, runner: R) -> Self {
        Self { executable, runner }
    }

    /// The environment manager executable.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// The runner used to query the manager.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Obtain the variables of `selected`, adding the conventional name and
    /// prefix variables when the manager did not report them.
    pub fn activate(&self, selected: &Path) -> Result<ActivationResult> {
        tracing::info!("Activating {}", selected.display());

        let stdout = self.runner.dump_environment(&self.executable, selected)?;
        let mut variables = parse_variables(&stdout);
        apply_defaults(&mut variables, selected);

        tracing::debug!("Environment defines {} variables", variables.len());
        Ok(ActivationResult {
            variables,
            environment_path: selected.to_path_buf(),
        })
    }
}

/// Parse `NAME=value` lines, splitting on the first `=`.
///
/// Lines without `=` or with an empty name are skipped.
///
/// # Example
///
/// ```
/// use envsel::environment::parse_variables;
///
/// let vars = parse_variables("FOO=bar\nBAZ=1=2\nmalformed_line\n");
/// assert_eq!(vars.len(), 2);
/// assert_eq!(vars["FOO"], "bar");
/// assert_eq!(vars["BAZ"], "1=2");
/// ```
pub fn parse_variables(stdout: &str) -> IndexMap<String, String> {
    stdout
        .lines()
        .filter_map(|line| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let (name, value) = line.split_once('=')?;
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

/// Fill in [`DEFAULT_ENV_NAME_VAR`] and [`PREFIX_VAR`] from the selected path
/// when they are missing.
pub fn apply_defaults(variables: &mut IndexMap<String, String>, selected: &Path) {
    if !variables.contains_key(DEFAULT_ENV_NAME_VAR) {
        let name = selected
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| selected.to_string_lossy().to_string());
        variables.insert(DEFAULT_ENV_NAME_VAR.to_string(), name);
    }

    if !variables.contains_key(PREFIX_VAR) {
        variables.insert(
            PREFIX_VAR.to_string(),
            selected.to_string_lossy().to_string(),
        );
    }
}
