//! Non-interactive UI for CI/headless environments.

use std::collections::HashMap;

use crate::error::{EnvselError, Result};

use super::{OutputMode, Prompt, SpinnerHandle, UserInterface};

/// Prefix of environment variables that answer prompts by key.
pub const PROMPT_ENV_PREFIX: &str = "ENVSEL_PROMPT_";

/// UI implementation for non-interactive mode.
///
/// Prompts are answered from `ENVSEL_PROMPT_<KEY>` variables, falling back
/// to the prompt's default.
pub struct NonInteractiveUI {
    mode: OutputMode,
    env_overrides: HashMap<String, String>,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI.
    pub fn new(mode: OutputMode) -> Self {
        let env_overrides: HashMap<String, String> = std::env::vars()
            .filter(|(k, _)| k.starts_with(PROMPT_ENV_PREFIX))
            .collect();

        Self {
            mode,
            env_overrides,
        }
    }

    /// Create with explicit overrides (for testing).
    pub fn with_overrides(mode: OutputMode, overrides: HashMap<String, String>) -> Self {
        Self {
            mode,
            env_overrides: overrides,
        }
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("✓ {}", msg);
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            eprintln!("⚠ {}", msg);
        }
    }

    fn error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<String> {
        let env_key = format!("{}{}", PROMPT_ENV_PREFIX, prompt.key.to_uppercase());
        if let Some(value) = self.env_overrides.get(&env_key) {
            return Ok(value.clone());
        }

        if let Some(default) = &prompt.default {
            return Ok(default.clone());
        }

        Err(EnvselError::PromptUnavailable {
            key: prompt.key.clone(),
            message: format!("no default in non-interactive mode; set {}", env_key),
        })
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            println!("  {}", message);
        }
        Box::new(NoopSpinner {
            show: self.mode.shows_status(),
        })
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            println!("\n{}\n", title);
        }
    }

    fn show_hint(&mut self, hint: &str) {
        if self.mode.shows_hints() {
            println!("  {}", hint);
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Spinner that prints only its final line.
struct NoopSpinner {
    show: bool,
}

impl SpinnerHandle for NoopSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        if self.show {
            println!("✓ {}", msg);
        }
    }

    fn finish_error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::PromptOption;

    fn environment_prompt(default: Option<&str>) -> Prompt {
        Prompt {
            key: "environment".to_string(),
            question: "Select an environment".to_string(),
            options: vec![PromptOption {
                label: "envA".to_string(),
                value: "/opt/envs/envA".to_string(),
            }],
            default: default.map(String::from),
        }
    }

    #[test]
    fn override_answers_prompt() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "ENVSEL_PROMPT_ENVIRONMENT".to_string(),
            "/opt/envs/envB".to_string(),
        );
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Normal, overrides);

        let answer = ui.prompt(&environment_prompt(Some("/opt/envs/envA"))).unwrap();

        assert_eq!(answer, "/opt/envs/envB");
    }

    #[test]
    fn default_answers_prompt_without_override() {
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Normal, HashMap::new());

        let answer = ui.prompt(&environment_prompt(Some("/opt/envs/envA"))).unwrap();

        assert_eq!(answer, "/opt/envs/envA");
    }

    #[test]
    fn no_default_is_prompt_unavailable() {
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Normal, HashMap::new());

        match ui.prompt(&environment_prompt(None)) {
            Err(EnvselError::PromptUnavailable { key, message }) => {
                assert_eq!(key, "environment");
                assert!(message.contains("ENVSEL_PROMPT_ENVIRONMENT"));
            }
            other => panic!("Expected PromptUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn is_never_interactive() {
        let ui = NonInteractiveUI::with_overrides(OutputMode::Normal, HashMap::new());
        assert!(!ui.is_interactive());
    }
}
