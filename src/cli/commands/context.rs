//! Per-invocation project context shared by commands.
//!
//! Loads the layered settings once, owns the configuration resolver, and
//! derives every project-relative location (sinks, state) from them.

use std::path::{Path, PathBuf};

use crate::config::{
    expand_home, load_settings, ConfigResolver, Configuration, InteractiveShellProbe, Settings,
    ShellProbe, SETTINGS_DIR,
};
use crate::environment::{Classification, EnvironmentActivator, EnvironmentCatalog, EnvironmentClassifier};
use crate::error::Result;
use crate::runner::ActivationSession;
use crate::sinks::{
    default_settings_file, DotEnvSink, InterpreterSetting, ScriptStyle, TerminalScriptSink,
};
use crate::state::{ProjectId, StateStore};

/// Settings, resolved configuration, and derived paths for one project.
pub struct ProjectContext<P: ShellProbe = InteractiveShellProbe> {
    project_root: PathBuf,
    resolver: ConfigResolver<P>,
}

impl ProjectContext<InteractiveShellProbe> {
    /// Load settings for `project_root`, optionally from an explicit file.
    pub fn load(project_root: &Path, config: Option<&Path>) -> Result<Self> {
        let settings = load_settings(project_root, config)?;
        Ok(Self::with_resolver(project_root, ConfigResolver::new(settings)))
    }
}

impl<P: ShellProbe> ProjectContext<P> {
    /// Build a context around an existing resolver.
    pub fn with_resolver(project_root: &Path, resolver: ConfigResolver<P>) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            resolver,
        }
    }

    /// The project directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// The merged user settings.
    pub fn settings(&self) -> &Settings {
        self.resolver.settings()
    }

    /// The resolved configuration (probes the shell at most once).
    pub fn configuration(&self) -> &Configuration {
        self.resolver.resolve()
    }

    /// Where the `.env` file is written.
    pub fn env_file_path(&self) -> PathBuf {
        self.project_path(self.settings().env_file.as_deref())
            .unwrap_or_else(|| self.project_root.join(".env"))
    }

    /// Where the terminal activation script is written.
    pub fn terminal_script_path(&self) -> PathBuf {
        self.project_path(self.settings().terminal_script.as_deref())
            .unwrap_or_else(|| {
                self.project_root
                    .join(SETTINGS_DIR)
                    .join(ScriptStyle::native().file_name())
            })
    }

    /// The editor settings file, unless interpreter updates are disabled.
    pub fn interpreter_settings_file(&self) -> Option<PathBuf> {
        if self.settings().update_interpreter_setting == Some(false) {
            None
        } else {
            Some(default_settings_file(&self.project_root))
        }
    }

    /// The project's identity for state storage.
    pub fn project_id(&self) -> Result<ProjectId> {
        ProjectId::from_path(&self.project_root)
    }

    /// The project's state file.
    pub fn state_file(&self) -> Result<PathBuf> {
        let id = self.project_id()?;
        Ok(match self.settings().state_dir() {
            Some(root) => StateStore::state_file_in(&self.resolve_in_project(&root), &id),
            None => StateStore::state_file(&id)?,
        })
    }

    /// The project's persisted state, or a fresh one.
    pub fn load_state(&self) -> Result<StateStore> {
        let file = self.state_file()?;
        match StateStore::load_from(&file)? {
            Some(state) => Ok(state),
            None => Ok(StateStore::new(&self.project_id()?)),
        }
    }

    /// Read the registry and classify it against this project.
    ///
    /// The environment recorded as last activated is marked active.
    pub fn classify(&self) -> Result<Classification> {
        let config = self.configuration();
        let entries = EnvironmentCatalog::list(&config.registry_file)?;
        let active = match self.load_state() {
            Ok(state) => state.last_environment,
            Err(e) => {
                tracing::warn!("Ignoring unreadable project state: {}", e);
                None
            }
        };

        Ok(EnvironmentClassifier::default().classify(
            &entries,
            Some(&self.project_root),
            config.root_prefix.as_deref(),
            active.as_deref(),
        ))
    }

    /// Build an activation session writing to every configured destination.
    pub fn session(&self) -> Result<ActivationSession<TerminalScriptSink>> {
        let activator = EnvironmentActivator::new(self.configuration().executable.clone());
        let terminal = TerminalScriptSink::new(self.terminal_script_path(), ScriptStyle::native());

        let mut session = ActivationSession::new(activator, terminal)
            .with_env_file(DotEnvSink::new(self.env_file_path()))
            .with_state_file(self.project_id()?, self.state_file()?);

        if let Some(file) = self.interpreter_settings_file() {
            session = session
                .with_interpreter_setting(InterpreterSetting::new(file, self.project_root.clone()));
        }

        Ok(session)
    }

    fn project_path(&self, configured: Option<&Path>) -> Option<PathBuf> {
        configured
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| self.resolve_in_project(p))
    }

    fn resolve_in_project(&self, path: &Path) -> PathBuf {
        let expanded = expand_home(path);
        if expanded.is_absolute() {
            expanded
        } else {
            self.project_root.join(expanded)
        }
    }
}
