//! Subprocess execution and shell detection.

pub mod command;
pub mod platform;

pub use command::{display_command, execute, CommandOptions, CommandResult};
pub use platform::{
    is_case_insensitive_fs, is_ci, shell_executable, variable_probe_command, ShellType,
};
