//! Terminal variable sinks.
//!
//! A terminal sink receives the complete variable set of an activation and
//! replaces whatever it held before, so variables of a previously activated
//! environment never survive into the next one.

use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Variable recording which names the last activation script exported.
pub const EXPORTED_NAMES_VAR: &str = "ENVSEL_VARIABLES";

/// Destination for the variables of an activated environment.
pub trait TerminalSink {
    /// Discard all previously set variables and set `variables`.
    fn replace(&mut self, variables: &IndexMap<String, String>) -> Result<()>;
}

/// Keeps variables in memory. Used by tests and embedders.
#[derive(Debug, Clone, Default)]
pub struct MemoryTerminalSink {
    variables: IndexMap<String, String>,
    replacements: usize,
}

impl MemoryTerminalSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Variables currently held.
    pub fn variables(&self) -> &IndexMap<String, String> {
        &self.variables
    }

    /// How many times the variable set was replaced.
    pub fn replacements(&self) -> usize {
        self.replacements
    }
}

impl TerminalSink for MemoryTerminalSink {
    fn replace(&mut self, variables: &IndexMap<String, String>) -> Result<()> {
        self.variables.clear();
        self.variables.extend(
            variables
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        self.replacements += 1;
        Ok(())
    }
}

/// Shell dialect of a generated activation script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStyle {
    /// `export NAME='value'` for sh, bash and zsh.
    Posix,
    /// `${env:NAME} = 'value'` for PowerShell.
    PowerShell,
}

impl ScriptStyle {
    /// Style matching the current platform.
    pub fn native() -> Self {
        if cfg!(target_os = "windows") {
            Self::PowerShell
        } else {
            Self::Posix
        }
    }

    /// Conventional file name for a script of this style.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Posix => "activate.sh",
            Self::PowerShell => "activate.ps1",
        }
    }
}

/// Writes an activation script that a terminal sources.
///
/// Sourcing the script first unsets every variable the previously sourced
/// script exported, then exports the new set.
#[derive(Debug, Clone)]
pub struct TerminalScriptSink {
    path: PathBuf,
    style: ScriptStyle,
}

impl TerminalScriptSink {
    /// Create a sink writing to `path`.
    pub fn new(path: PathBuf, style: ScriptStyle) -> Self {
        Self { path, style }
    }

    /// Where the script is written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The script dialect.
    pub fn style(&self) -> ScriptStyle {
        self.style
    }

    /// The command a user runs to load the script.
    pub fn source_command(&self) -> String {
        match self.style {
            ScriptStyle::Posix => format!(". {}", sh_quote(&self.path.to_string_lossy())),
            ScriptStyle::PowerShell => format!(". {}", ps_quote(&self.path.to_string_lossy())),
        }
    }

    /// Render the script content for `variables`.
    pub fn render(&self, variables: &IndexMap<String, String>) -> String {
        match self.style {
            ScriptStyle::Posix => render_posix(variables),
            ScriptStyle::PowerShell => render_powershell(variables),
        }
    }
}

impl TerminalSink for TerminalScriptSink {
    fn replace(&mut self, variables: &IndexMap<String, String>) -> Result<()> {
        let content = self.render(variables);
        write_atomic(&self.path, &content)?;
        tracing::debug!("Wrote activation script {}", self.path.display());
        Ok(())
    }
}

/// Write via a temp file and rename so readers never see a partial file.
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

fn is_shell_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

fn sh_quote(raw: &str) -> String {
    if raw.is_empty() {
        return "''".to_string();
    }
    let safe = raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '@' | '+')
    });
    if safe {
        raw.to_string()
    } else {
        let escaped = raw.replace('\'', "'\"'\"'");
        format!("'{escaped}'")
    }
}

fn ps_quote(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}

fn render_posix(variables: &IndexMap<String, String>) -> String {
    let mut out = String::from("# Generated by envsel. Source this file; do not edit.\n");
    // eval splits the list in every shell; zsh does not split `$VAR` itself
    out.push_str(&format!(
        "if [ -n \"${{{0}:-}}\" ]; then eval \"unset ${0}\"; fi\n",
        EXPORTED_NAMES_VAR
    ));

    let mut exported = Vec::new();
    for (name, value) in variables {
        if name == EXPORTED_NAMES_VAR {
            continue;
        }
        if !is_shell_identifier(name) {
            tracing::debug!("Skipping variable with non-shell name: {}", name);
            continue;
        }
        out.push_str(&format!("export {}={}\n", name, sh_quote(value)));
        exported.push(name.as_str());
    }

    out.push_str(&format!(
        "export {}={}\n",
        EXPORTED_NAMES_VAR,
        sh_quote(&exported.join(" "))
    ));
    out
}

fn render_powershell(variables: &IndexMap<String, String>) -> String {
    let mut out = String::from("# Generated by envsel. Dot-source this file; do not edit.\n");
    out.push_str(&format!(
        "if ($env:{0}) {{ foreach ($n in $env:{0}.Split(';')) {{ Remove-Item -LiteralPath \"env:$n\" -ErrorAction SilentlyContinue }} }}\n",
        EXPORTED_NAMES_VAR
    ));

    let mut exported = Vec::new();
    for (name, value) in variables {
        if name == EXPORTED_NAMES_VAR {
            continue;
        }
        if name.contains(['}', ';']) {
            tracing::debug!("Skipping variable with unsupported name: {}", name);
            continue;
        }
        out.push_str(&format!("${{env:{}}} = {}\n", name, ps_quote(value)));
        exported.push(name.as_str());
    }

    out.push_str(&format!(
        "${{env:{}}} = {}\n",
        EXPORTED_NAMES_VAR,
        ps_quote(&exported.join(";"))
    ));
    out
}
