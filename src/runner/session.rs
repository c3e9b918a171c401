//! Activation sessions.
//!
//! An [`ActivationSession`] ties an [`EnvironmentActivator`] to the places
//! its result is applied. The manager is queried first; only when that
//! succeeds are the sinks and the persisted state touched, so a failed
//! activation leaves every destination exactly as it was.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use super::guard::InFlightGuard;
use crate::environment::{EnvironmentActivator, EnvironmentRunner, ManagerRunner};
use crate::error::{EnvselError, Result};
use crate::sinks::{DotEnvSink, InterpreterSetting, TerminalSink, EXPORTED_NAMES_VAR};
use crate::state::{ProjectId, StateStore};

/// What a successful activation changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationOutcome {
    /// The environment that is now active.
    pub environment_path: PathBuf,
    /// Number of variables handed to the sinks.
    pub variable_count: usize,
    /// Whether the `.env` file was written.
    pub env_file_written: bool,
    /// Whether the editor interpreter setting was updated.
    pub interpreter_updated: bool,
    /// Whether the choice was persisted for the project.
    pub state_saved: bool,
    /// Non-fatal problems, already logged.
    pub warnings: Vec<String>,
}

struct StateTarget {
    project: ProjectId,
    file: PathBuf,
}

/// Activates environments and applies their variables.
pub struct ActivationSession<T: TerminalSink, R: EnvironmentRunner = ManagerRunner> {
    activator: EnvironmentActivator<R>,
    terminal: Mutex<T>,
    env_file: Option<DotEnvSink>,
    interpreter: Option<InterpreterSetting>,
    state: Option<StateTarget>,
    guard: InFlightGuard,
}

impl<T: TerminalSink, R: EnvironmentRunner> ActivationSession<T, R> {
    /// Create a session applying results to `terminal` only.
    pub fn new(activator: EnvironmentActivator<R>, terminal: T) -> Self {
        Self {
            activator,
            terminal: Mutex::new(terminal),
            env_file: None,
            interpreter: None,
            state: None,
            guard: InFlightGuard::new(),
        }
    }

    /// Also write a `.env` file.
    pub fn with_env_file(mut self, sink: DotEnvSink) -> Self {
        self.env_file = Some(sink);
        self
    }

    /// Also update the editor interpreter setting.
    pub fn with_interpreter_setting(mut self, setting: InterpreterSetting) -> Self {
        self.interpreter = Some(setting);
        self
    }

    /// Persist each activation in an explicit state file.
    pub fn with_state_file(mut self, project: ProjectId, file: PathBuf) -> Self {
        self.state = Some(StateTarget { project, file });
        self
    }

    /// The activator used by this session.
    pub fn activator(&self) -> &EnvironmentActivator<R> {
        &self.activator
    }

    /// Whether an activation is running.
    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    /// Run `f` with the terminal sink.
    pub fn with_terminal<U>(&self, f: impl FnOnce(&T) -> U) -> Result<U> {
        let terminal = self.lock_terminal()?;
        Ok(f(&terminal))
    }

    /// Activate `environment` and apply its variables everywhere.
    ///
    /// # Errors
    ///
    /// - [`EnvselError::ActivationInProgress`] if another activation through
    ///   this session has not finished
    /// - [`EnvselError::ActivationFailed`] if the manager cannot produce the
    ///   environment's variables; nothing is modified in that case
    /// - any error replacing the terminal variables
    ///
    /// `.env`, interpreter setting, and state failures are logged and
    /// reported in [`ActivationOutcome::warnings`].
    pub fn activate(&self, environment: &Path) -> Result<ActivationOutcome> {
        let _slot = self.guard.try_acquire()?;

        let mut result = self.activator.activate(environment)?;
        // Left over when envsel runs from a shell that sourced an earlier script
        if result.variables.shift_remove(EXPORTED_NAMES_VAR).is_some() {
            tracing::debug!("Dropped inherited {}", EXPORTED_NAMES_VAR);
        }
        let variables = &result.variables;

        self.lock_terminal()?.replace(variables)?;

        let mut warnings = Vec::new();

        let env_file_written = match &self.env_file {
            Some(sink) => match sink.write(variables) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Failed to write {}: {}", sink.path().display(), e);
                    warnings.push(format!("Could not write {}: {}", sink.path().display(), e));
                    false
                }
            },
            None => false,
        };

        let interpreter_updated = match &self.interpreter {
            Some(setting) => match setting.update(&result.environment_path) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Failed to update interpreter setting: {}", e);
                    warnings.push(format!("Could not update interpreter setting: {}", e));
                    false
                }
            },
            None => false,
        };

        let state_saved = match &self.state {
            Some(target) => match record(target, &result.environment_path, variables.len()) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Failed to save project state: {}", e);
                    warnings.push(format!("Could not remember this environment: {}", e));
                    false
                }
            },
            None => false,
        };

        tracing::info!(
            "Activated {} ({} variables)",
            result.environment_path.display(),
            variables.len()
        );

        Ok(ActivationOutcome {
            variable_count: variables.len(),
            environment_path: result.environment_path,
            env_file_written,
            interpreter_updated,
            state_saved,
            warnings,
        })
    }

    fn lock_terminal(&self) -> Result<std::sync::MutexGuard<'_, T>> {
        self.terminal
            .lock()
            .map_err(|_| EnvselError::Other(anyhow::anyhow!("terminal sink lock poisoned")))
    }
}

fn record(target: &StateTarget, environment: &Path, variable_count: usize) -> Result<()> {
    let mut state =
        StateStore::load_from(&target.file)?.unwrap_or_else(|| StateStore::new(&target.project));
    state.record_activation(environment, variable_count);
    state.save_to(&target.file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::MemoryTerminalSink;
    use indexmap::IndexMap;
    use std::fs;
    use std::sync::Barrier;
    use tempfile::TempDir;

    struct StaticRunner(std::result::Result<String, String>);

    impl EnvironmentRunner for StaticRunner {
        fn dump_environment(&self, _executable: &Path, environment: &Path) -> Result<String> {
            self.0
                .clone()
                .map_err(|message| EnvselError::ActivationFailed {
                    path: environment.to_path_buf(),
                    message,
                })
        }
    }

    struct BlockingRunner {
        entered: Barrier,
        release: Barrier,
    }

    impl EnvironmentRunner for BlockingRunner {
        fn dump_environment(&self, _executable: &Path, _environment: &Path) -> Result<String> {
            self.entered.wait();
            self.release.wait();
            Ok("A=1\n".to_string())
        }
    }

    fn session(
        runner: StaticRunner,
        temp: &TempDir,
    ) -> ActivationSession<MemoryTerminalSink, StaticRunner> {
        let project = ProjectId::from_path(temp.path()).unwrap();
        ActivationSession::new(
            EnvironmentActivator::with_runner(PathBuf::from("micromamba"), runner),
            MemoryTerminalSink::new(),
        )
        .with_env_file(DotEnvSink::new(temp.path().join(".env")))
        .with_interpreter_setting(InterpreterSetting::new(
            temp.path().join(".vscode").join("settings.json"),
            temp.path().to_path_buf(),
        ))
        .with_state_file(project, temp.path().join("state").join("state.yml"))
    }

    #[test]
    fn successful_activation_updates_every_destination() {
        let temp = TempDir::new().unwrap();
        let session = session(StaticRunner(Ok("PATH=/opt/envs/a/bin\n".into())), &temp);

        let outcome = session.activate(Path::new("/opt/envs/a")).unwrap();

        assert_eq!(outcome.environment_path, PathBuf::from("/opt/envs/a"));
        assert_eq!(outcome.variable_count, 3);
        assert!(outcome.env_file_written);
        assert!(outcome.interpreter_updated);
        assert!(outcome.state_saved);
        assert!(outcome.warnings.is_empty());

        let terminal = session.with_terminal(|t| t.variables().clone()).unwrap();
        assert_eq!(terminal["CONDA_DEFAULT_ENV"], "a");
        assert!(fs::read_to_string(temp.path().join(".env"))
            .unwrap()
            .contains("PATH=\"/opt/envs/a/bin\""));

        let state = StateStore::load_from(&temp.path().join("state").join("state.yml"))
            .unwrap()
            .unwrap();
        assert_eq!(state.last_environment, Some(PathBuf::from("/opt/envs/a")));
    }

    #[test]
    fn failed_activation_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let session = session(StaticRunner(Err("boom".into())), &temp);

        let result = session.activate(Path::new("/opt/envs/broken"));

        assert!(matches!(result, Err(EnvselError::ActivationFailed { .. })));
        assert_eq!(session.with_terminal(|t| t.replacements()).unwrap(), 0);
        assert!(!temp.path().join(".env").exists());
        assert!(!temp.path().join(".vscode").exists());
        assert!(!temp.path().join("state").exists());
        assert!(!session.is_busy());
    }

    #[test]
    fn failed_activation_keeps_previous_variables() {
        let temp = TempDir::new().unwrap();
        let mut previous = IndexMap::new();
        previous.insert("FROM_A".to_string(), "1".to_string());
        let mut terminal = MemoryTerminalSink::new();
        terminal.replace(&previous).unwrap();
        fs::write(temp.path().join(".env"), "FROM_A=\"1\"\n").unwrap();

        let session = ActivationSession::new(
            EnvironmentActivator::with_runner(
                PathBuf::from("micromamba"),
                StaticRunner(Err("boom".into())),
            ),
            terminal,
        )
        .with_env_file(DotEnvSink::new(temp.path().join(".env")));

        assert!(session.activate(Path::new("/opt/envs/b")).is_err());

        assert_eq!(
            session.with_terminal(|t| t.variables().clone()).unwrap(),
            previous
        );
        assert_eq!(
            fs::read_to_string(temp.path().join(".env")).unwrap(),
            "FROM_A=\"1\"\n"
        );
    }

    #[test]
    fn env_file_failure_is_a_warning() {
        let temp = TempDir::new().unwrap();
        // A directory where the file should go makes the write fail.
        let blocked = temp.path().join("blocked");
        fs::create_dir_all(blocked.join(".env")).unwrap();
        let project = ProjectId::from_path(temp.path()).unwrap();

        let session = ActivationSession::new(
            EnvironmentActivator::with_runner(
                PathBuf::from("micromamba"),
                StaticRunner(Ok("A=1\n".into())),
            ),
            MemoryTerminalSink::new(),
        )
        .with_env_file(DotEnvSink::new(blocked.join(".env")))
        .with_interpreter_setting(InterpreterSetting::new(
            temp.path().join(".vscode").join("settings.json"),
            temp.path().to_path_buf(),
        ))
        .with_state_file(project, temp.path().join("state.yml"));

        let outcome = session.activate(Path::new("/opt/envs/a")).unwrap();

        assert!(!outcome.env_file_written);
        assert!(outcome.interpreter_updated);
        assert!(outcome.state_saved);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(session.with_terminal(|t| t.replacements()).unwrap(), 1);
    }

    #[test]
    fn overlapping_activation_is_rejected() {
        let runner = BlockingRunner {
            entered: Barrier::new(2),
            release: Barrier::new(2),
        };
        let session = ActivationSession::new(
            EnvironmentActivator::with_runner(PathBuf::from("micromamba"), runner),
            MemoryTerminalSink::new(),
        );

        std::thread::scope(|scope| {
            let first = scope.spawn(|| session.activate(Path::new("/opt/envs/a")));

            session.activator().runner().entered.wait();
            let second = session.activate(Path::new("/opt/envs/b"));
            assert!(matches!(second, Err(EnvselError::ActivationInProgress)));
            session.activator().runner().release.wait();

            let outcome = first.join().unwrap().unwrap();
            assert_eq!(outcome.environment_path, PathBuf::from("/opt/envs/a"));
        });

        assert!(!session.is_busy());
    }

    #[test]
    fn inherited_exported_name_list_is_not_applied() {
        let temp = TempDir::new().unwrap();
        let session = session(
            StaticRunner(Ok("ENVSEL_VARIABLES=OLD_A OLD_B\nFOO=1\n".into())),
            &temp,
        );

        let outcome = session.activate(Path::new("/opt/envs/a")).unwrap();

        let vars = session.with_terminal(|t| t.variables().clone()).unwrap();
        assert!(!vars.contains_key(EXPORTED_NAMES_VAR));
        assert_eq!(vars["FOO"], "1");
        assert_eq!(outcome.variable_count, 3);

        let env_file = fs::read_to_string(temp.path().join(".env")).unwrap();
        assert!(!env_file.contains(EXPORTED_NAMES_VAR));
        assert!(env_file.contains("FOO=\"1\""));
    }

    #[test]
    fn later_activation_replaces_terminal_variables() {
        let temp = TempDir::new().unwrap();
        let session = session(StaticRunner(Ok("ONLY=x\n".into())), &temp);

        session.activate(Path::new("/opt/envs/a")).unwrap();
        session.activate(Path::new("/opt/envs/b")).unwrap();

        let vars = session.with_terminal(|t| t.variables().clone()).unwrap();
        assert_eq!(vars["CONDA_PREFIX"], "/opt/envs/b");
        assert_eq!(vars.len(), 3);
    }
}
