//! .env file parsing and rendering.
//!
//! This module reads and writes environment variable files in the standard
//! `KEY=value` format. Files written by [`render`] use `KEY="value"` with
//! backslashes and double quotes escaped, which [`EnvFileParser`] reverses.

use anyhow::Result;
use indexmap::IndexMap;
use std::path::Path;

/// Parses .env files into an ordered map of environment variables.
///
/// # Supported Formats
///
/// - Simple: `KEY=value`
/// - Quoted: `KEY="value with spaces"` or `KEY='single quoted'`
/// - Escapes inside double quotes: `KEY="say \"hi\""`
/// - Empty: `KEY=`
/// - Comments: `# This is a comment`
/// - Values with equals signs: `URL=https://example.com?foo=bar`
///
/// # Example
///
/// ```
/// use envsel::config::EnvFileParser;
///
/// let content = r#"
/// # written by envsel
/// CONDA_PREFIX="/opt/micromamba/envs/data"
/// PS1="(data) \"$ \""
/// EMPTY=
/// "#;
///
/// let vars = EnvFileParser::parse(content).unwrap();
/// assert_eq!(vars.get("CONDA_PREFIX"), Some(&"/opt/micromamba/envs/data".to_string()));
/// assert_eq!(vars.get("PS1"), Some(&"(data) \"$ \"".to_string()));
/// assert_eq!(vars.get("EMPTY"), Some(&"".to_string()));
/// ```
pub struct EnvFileParser;

impl EnvFileParser {
    /// Parse an env file content string into a map of variables.
    pub fn parse(content: &str) -> Result<IndexMap<String, String>> {
        let mut vars = IndexMap::new();

        for line in content.lines() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = Self::parse_line(line) {
                vars.insert(key, value);
            }
        }

        Ok(vars)
    }

    /// Parse a single line.
    fn parse_line(line: &str) -> Option<(String, String)> {
        let (key, value) = line.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }

        Some((key.to_string(), Self::unquote(value.trim())))
    }

    /// Remove surrounding quotes from a value, resolving escapes in
    /// double-quoted values.
    fn unquote(value: &str) -> String {
        if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
            unescape(&value[1..value.len() - 1])
        } else if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
            value[1..value.len() - 1].to_string()
        } else {
            value.to_string()
        }
    }

    /// Load and parse an env file from a path.
    pub fn load(path: &Path) -> Result<IndexMap<String, String>> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }
}

/// Render variables as `.env` content, one `KEY="value"` line each.
///
/// # Example
///
/// ```
/// use envsel::config::render_env_file;
/// use indexmap::IndexMap;
///
/// let mut vars = IndexMap::new();
/// vars.insert("GREETING".to_string(), "say \"hi\"".to_string());
/// assert_eq!(render_env_file(&vars), "GREETING=\"say \\\"hi\\\"\"\n");
/// ```
pub fn render(vars: &IndexMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in vars {
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value));
        out.push_str("\"\n");
    }
    out
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(next @ ('\\' | '"')) => out.push(next),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
