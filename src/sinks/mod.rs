//! Destinations for activated environment variables.
//!
//! - [`TerminalSink`] implementations replace a terminal's variable set
//! - [`DotEnvSink`] writes a `.env` file
//! - [`InterpreterSetting`] keeps the editor's interpreter path in sync

pub mod dotenv;
pub mod interpreter;
pub mod terminal;

pub use dotenv::DotEnvSink;
pub use interpreter::{
    default_settings_file, interpreter_path, InterpreterSetting, INTERPRETER_SETTING_KEY,
    WORKSPACE_FOLDER,
};
pub use terminal::{
    MemoryTerminalSink, ScriptStyle, TerminalScriptSink, TerminalSink, EXPORTED_NAMES_VAR,
};
