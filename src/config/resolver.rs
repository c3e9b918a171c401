//! Configuration resolution.
//!
//! [`ConfigResolver`] turns explicit [`Settings`] into a complete
//! [`Configuration`]. Each field is taken from, in order:
//! 1. the explicit setting
//! 2. the user's interactive shell (`MAMBA_ROOT_PREFIX`, `MAMBA_EXE`)
//! 3. a built-in default
//!
//! The shell is only consulted when the root prefix or executable is unset,
//! and the merged result is cached for the lifetime of the resolver.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::{EnvselError, Result};
use crate::shell::{self, CommandOptions};

use super::Settings;

/// Executable used when neither settings nor the shell name one.
pub const DEFAULT_EXECUTABLE: &str = "micromamba";

/// Shell variable holding the environment manager's root prefix.
pub const ROOT_PREFIX_VAR: &str = "MAMBA_ROOT_PREFIX";

/// Shell variable holding the environment manager's executable path.
pub const EXECUTABLE_VAR: &str = "MAMBA_EXE";

/// Upper bound on how long shell discovery may take.
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Configuration {
    /// Directory holding globally managed environments, if known.
    pub root_prefix: Option<PathBuf>,

    /// Environment manager executable.
    pub executable: PathBuf,

    /// Registry file listing known environments.
    pub registry_file: PathBuf,
}

/// Values reported by the user's shell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredVariables {
    pub root_prefix: Option<String>,
    pub executable: Option<String>,
}

impl DiscoveredVariables {
    /// Parse probe output: the root prefix line followed by the executable line.
    ///
    /// Interactive shells may print banners from rc files first, so only the
    /// last two lines are used.
    pub fn parse(stdout: &str) -> Self {
        let lines: Vec<&str> = stdout.lines().collect();
        if lines.len() < 2 {
            return Self {
                root_prefix: lines.first().and_then(|l| non_blank(l)),
                executable: None,
            };
        }

        let tail = &lines[lines.len() - 2..];
        Self {
            root_prefix: non_blank(tail[0]),
            executable: non_blank(tail[1]),
        }
    }
}

fn non_blank(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Source of shell-exported variables.
pub trait ShellProbe {
    /// Ask the shell for the root prefix and executable.
    fn discover(&self) -> Result<DiscoveredVariables>;
}

/// Probes the user's interactive shell so profile-sourced exports are visible.
#[derive(Debug, Clone)]
pub struct InteractiveShellProbe {
    shell: PathBuf,
    timeout: Duration,
}

impl InteractiveShellProbe {
    /// Probe the user's own shell with the default timeout.
    pub fn new() -> Self {
        Self::with_shell(shell::shell_executable())
    }

    /// Probe a specific shell executable.
    pub fn with_shell(shell: PathBuf) -> Self {
        Self {
            shell,
            timeout: DISCOVERY_TIMEOUT,
        }
    }

    /// Override the discovery timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for InteractiveShellProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellProbe for InteractiveShellProbe {
    fn discover(&self) -> Result<DiscoveredVariables> {
        let (program, args) =
            shell::variable_probe_command(&self.shell, &[ROOT_PREFIX_VAR, EXECUTABLE_VAR]);
        let options = CommandOptions {
            timeout: Some(self.timeout),
        };

        let result = shell::execute(&program, &args, &options).map_err(|e| {
            EnvselError::ConfigDiscoveryFailed {
                message: e.to_string(),
            }
        })?;

        if result.timed_out {
            return Err(EnvselError::ConfigDiscoveryFailed {
                message: format!("{} timed out after {:?}", program, self.timeout),
            });
        }

        if !result.success {
            return Err(EnvselError::ConfigDiscoveryFailed {
                message: format!(
                    "{} exited with code {:?}: {}",
                    program,
                    result.exit_code,
                    result.stderr.trim()
                ),
            });
        }

        Ok(DiscoveredVariables::parse(&result.stdout))
    }
}

/// Merges settings with shell discovery and caches the result.
///
/// Construct one per process (or per test); later changes to the settings
/// are not observed once [`ConfigResolver::resolve`] has run.
pub struct ConfigResolver<P: ShellProbe = InteractiveShellProbe> {
    settings: Settings,
    probe: P,
    home: Option<PathBuf>,
    cache: OnceLock<Configuration>,
}

impl ConfigResolver<InteractiveShellProbe> {
    /// Create a resolver that probes the user's interactive shell.
    pub fn new(settings: Settings) -> Self {
        Self::with_probe(settings, InteractiveShellProbe::new())
    }
}

impl<P: ShellProbe> ConfigResolver<P> {
    /// Create a resolver with a custom shell probe.
    pub fn with_probe(settings: Settings, probe: P) -> Self {
        Self {
            settings,
            probe,
            home: dirs::home_dir(),
            cache: OnceLock::new(),
        }
    }

    /// Override the home directory used for the default registry location.
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// The explicit settings this resolver was built from.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Resolve the configuration, probing the shell at most once.
    pub fn resolve(&self) -> &Configuration {
        self.cache.get_or_init(|| self.compute())
    }

    fn compute(&self) -> Configuration {
        let mut root_prefix = self.settings.root_prefix();
        let mut executable = self.settings.executable();

        if root_prefix.is_none() || executable.is_none() {
            match self.probe.discover() {
                Ok(found) => {
                    tracing::debug!("Shell reported {:?}", found);
                    root_prefix = root_prefix.or(found.root_prefix.map(PathBuf::from));
                    executable = executable.or(found.executable.map(PathBuf::from));
                }
                Err(e) => tracing::warn!("{}", e),
            }
        }

        let configuration = Configuration {
            root_prefix,
            executable: executable.unwrap_or_else(|| PathBuf::from(DEFAULT_EXECUTABLE)),
            registry_file: self
                .settings
                .registry_file()
                .unwrap_or_else(|| default_registry_file(self.home.as_deref())),
        };
        tracing::debug!("Resolved configuration: {:?}", configuration);
        configuration
    }
}

/// `<home>/.conda/environments.txt`.
pub fn default_registry_file(home: Option<&Path>) -> PathBuf {
    home.map(Path::to_path_buf)
        .unwrap_or_default()
        .join(".conda")
        .join("environments.txt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FakeProbe {
        answer: Option<DiscoveredVariables>,
        calls: Cell<usize>,
    }

    impl FakeProbe {
        fn answering(root_prefix: Option<&str>, executable: Option<&str>) -> Self {
            Self {
                answer: Some(DiscoveredVariables {
                    root_prefix: root_prefix.map(String::from),
                    executable: executable.map(String::from),
                }),
                calls: Cell::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                answer: None,
                calls: Cell::new(0),
            }
        }
    }

    impl ShellProbe for &FakeProbe {
        fn discover(&self) -> Result<DiscoveredVariables> {
            self.calls.set(self.calls.get() + 1);
            self.answer
                .clone()
                .ok_or_else(|| EnvselError::ConfigDiscoveryFailed {
                    message: "shell exited with code 1".into(),
                })
        }
    }

    #[test]
    fn explicit_settings_skip_the_shell() {
        let probe = FakeProbe::answering(Some("/shell/prefix"), Some("/shell/mm"));
        let settings = Settings {
            root_prefix: Some(PathBuf::from("/opt/micromamba")),
            executable: Some(PathBuf::from("/opt/micromamba/bin/micromamba")),
            ..Default::default()
        };

        let resolver = ConfigResolver::with_probe(settings, &probe);
        let config = resolver.resolve();

        assert_eq!(probe.calls.get(), 0);
        assert_eq!(config.root_prefix, Some(PathBuf::from("/opt/micromamba")));
        assert_eq!(
            config.executable,
            PathBuf::from("/opt/micromamba/bin/micromamba")
        );
    }

    #[test]
    fn missing_settings_are_filled_from_the_shell() {
        let probe = FakeProbe::answering(Some("/shell/prefix"), Some("/shell/mm"));
        let settings = Settings {
            executable: Some(PathBuf::from("/explicit/mm")),
            ..Default::default()
        };

        let resolver = ConfigResolver::with_probe(settings, &probe);
        let config = resolver.resolve();

        assert_eq!(probe.calls.get(), 1);
        assert_eq!(config.root_prefix, Some(PathBuf::from("/shell/prefix")));
        assert_eq!(config.executable, PathBuf::from("/explicit/mm"));
    }

    #[test]
    fn shell_failure_degrades_to_defaults() {
        let probe = FakeProbe::failing();

        let resolver = ConfigResolver::with_probe(Settings::default(), &probe)
            .with_home(Some(PathBuf::from("/home/u")));
        let config = resolver.resolve();

        assert_eq!(config.root_prefix, None);
        assert_eq!(config.executable, PathBuf::from(DEFAULT_EXECUTABLE));
        assert_eq!(
            config.registry_file,
            PathBuf::from("/home/u/.conda/environments.txt")
        );
    }

    #[test]
    fn empty_shell_values_fall_back_to_default_executable() {
        let probe = FakeProbe::answering(None, None);

        let resolver = ConfigResolver::with_probe(Settings::default(), &probe);

        assert_eq!(resolver.resolve().executable, PathBuf::from("micromamba"));
    }

    #[test]
    fn resolve_is_memoized() {
        let probe = FakeProbe::answering(Some("/p"), Some("/mm"));
        let resolver = ConfigResolver::with_probe(Settings::default(), &probe);

        let first = resolver.resolve().clone();
        let second = resolver.resolve().clone();

        assert_eq!(first, second);
        assert_eq!(probe.calls.get(), 1);
    }

    #[test]
    fn fresh_resolvers_do_not_share_a_cache() {
        let probe = FakeProbe::answering(Some("/p"), Some("/mm"));

        ConfigResolver::with_probe(Settings::default(), &probe).resolve();
        ConfigResolver::with_probe(Settings::default(), &probe).resolve();

        assert_eq!(probe.calls.get(), 2);
    }

    #[test]
    fn explicit_registry_file_wins() {
        let probe = FakeProbe::failing();
        let settings = Settings {
            registry_file: Some(PathBuf::from("/srv/envs.txt")),
            ..Default::default()
        };

        let resolver = ConfigResolver::with_probe(settings, &probe);

        assert_eq!(
            resolver.resolve().registry_file,
            PathBuf::from("/srv/envs.txt")
        );
    }

    #[test]
    fn discovered_variables_use_last_two_lines() {
        let parsed = DiscoveredVariables::parse("Welcome back!\n/opt/mamba\n/opt/mamba/bin/mm\n");

        assert_eq!(parsed.root_prefix.as_deref(), Some("/opt/mamba"));
        assert_eq!(parsed.executable.as_deref(), Some("/opt/mamba/bin/mm"));
    }

    #[test]
    fn discovered_variables_treat_blank_lines_as_unset() {
        let parsed = DiscoveredVariables::parse("\n/usr/bin/micromamba\n");

        assert_eq!(parsed.root_prefix, None);
        assert_eq!(parsed.executable.as_deref(), Some("/usr/bin/micromamba"));
    }

    #[test]
    fn discovered_variables_handle_crlf() {
        let parsed = DiscoveredVariables::parse("C:\\mamba\r\nC:\\mamba\\micromamba.exe\r\n");

        assert_eq!(parsed.root_prefix.as_deref(), Some("C:\\mamba"));
        assert_eq!(
            parsed.executable.as_deref(),
            Some("C:\\mamba\\micromamba.exe")
        );
    }

    #[cfg(unix)]
    #[test]
    fn interactive_probe_reports_missing_shell() {
        let probe = InteractiveShellProbe::with_shell(PathBuf::from("/nonexistent/shell"));
        assert!(matches!(
            probe.discover(),
            Err(EnvselError::ConfigDiscoveryFailed { .. })
        ));
    }
}
