//! Settings loading, configuration resolution, and `.env` files.
//!
//! - Layered YAML settings in [`settings`]
//! - Shell discovery and caching in [`resolver`]
//! - `.env` parsing and rendering in [`env_file`]
//!
//! # Example
//!
//! ```
//! use envsel::config::{ConfigResolver, DiscoveredVariables, Settings, ShellProbe};
//! use std::path::PathBuf;
//!
//! struct NoShell;
//!
//! impl ShellProbe for NoShell {
//!     fn discover(&self) -> envsel::Result<DiscoveredVariables> {
//!         Ok(DiscoveredVariables::default())
//!     }
//! }
//!
//! let settings = Settings {
//!     root_prefix: Some(PathBuf::from("/opt/micromamba")),
//!     ..Default::default()
//! };
//! let resolver = ConfigResolver::with_probe(settings, NoShell);
//! let config = resolver.resolve();
//! assert_eq!(config.executable, PathBuf::from("micromamba"));
//! ```

pub mod env_file;
pub mod resolver;
pub mod settings;

pub use env_file::{render as render_env_file, EnvFileParser};
pub use resolver::{
    default_registry_file, ConfigResolver, Configuration, DiscoveredVariables,
    InteractiveShellProbe, ShellProbe, DEFAULT_EXECUTABLE, DISCOVERY_TIMEOUT, EXECUTABLE_VAR,
    ROOT_PREFIX_VAR,
};
pub use settings::{
    envsel_home, expand_home, load_settings, Settings, SettingsPaths, HOME_VAR, SETTINGS_DIR,
};

#[cfg(test)]
mod tests {
    #[test]
    fn serde_yaml_parses_basic_yaml() {
        let yaml = "root_prefix: /opt/micromamba\nupdate_interpreter_setting: true";
        let parsed: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed["root_prefix"], "/opt/micromamba");
        assert_eq!(parsed["update_interpreter_setting"], true);
    }
}
