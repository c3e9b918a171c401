//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion. It can be configured with
//! pre-determined prompt responses.
//!
//! # Example
//!
//! ```
//! use envsel::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.set_prompt_response("environment", "/opt/envs/data");
//!
//! ui.message("Reading registry");
//! ui.success("Activated data");
//!
//! assert!(ui.has_message("Reading registry"));
//! assert!(ui.has_success("Activated data"));
//! ```

use std::collections::HashMap;

use crate::error::Result;

use super::{OutputMode, Prompt, SpinnerHandle, UserInterface};

/// Mock UI implementation for testing.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    interactive: bool,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    headers: Vec<String>,
    hints: Vec<String>,
    spinners: Vec<String>,
    prompt_responses: HashMap<String, String>,
    prompts_shown: Vec<Prompt>,
}

impl MockUI {
    /// Create a new MockUI with Normal output mode.
    pub fn new() -> Self {
        Self {
            mode: OutputMode::Normal,
            ..Default::default()
        }
    }

    /// Set a response for a prompt key.
    pub fn set_prompt_response(&mut self, key: &str, response: &str) {
        self.prompt_responses
            .insert(key.to_string(), response.to_string());
    }

    /// Set whether this mock behaves as interactive.
    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    /// Get all captured messages.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Get all captured success messages.
    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    /// Get all captured warning messages.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Get all captured error messages.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Get all captured headers.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Get all captured hints.
    pub fn hints(&self) -> &[String] {
        &self.hints
    }

    /// Get all spinner messages that were started.
    pub fn spinners(&self) -> &[String] {
        &self.spinners
    }

    /// Get all prompts that were shown.
    pub fn prompts_shown(&self) -> &[Prompt] {
        &self.prompts_shown
    }

    /// Check if a specific message was shown.
    pub fn has_message(&self, msg: &str) -> bool {
        self.messages.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific success was shown.
    pub fn has_success(&self, msg: &str) -> bool {
        self.successes.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific warning was shown.
    pub fn has_warning(&self, msg: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific error was shown.
    pub fn has_error(&self, msg: &str) -> bool {
        self.errors.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific hint was shown.
    pub fn has_hint(&self, msg: &str) -> bool {
        self.hints.iter().any(|m| m.contains(msg))
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<String> {
        self.prompts_shown.push(prompt.clone());

        if let Some(response) = self.prompt_responses.get(&prompt.key) {
            return Ok(response.clone());
        }

        if let Some(default) = &prompt.default {
            return Ok(default.clone());
        }

        Ok(prompt
            .options
            .first()
            .map(|o| o.value.clone())
            .unwrap_or_default())
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.spinners.push(message.to_string());
        Box::new(MockSpinner::new())
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn show_hint(&mut self, hint: &str) {
        self.hints.push(hint.to_string());
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// Mock spinner for testing.
#[derive(Debug, Default)]
pub struct MockSpinner {
    messages: Vec<String>,
    finished: Option<(bool, String)>,
}

impl MockSpinner {
    /// Create a new mock spinner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages set while running.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Final state as (succeeded, message), if finished.
    pub fn finished(&self) -> Option<&(bool, String)> {
        self.finished.as_ref()
    }
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        self.finished = Some((true, msg.to_string()));
    }

    fn finish_error(&mut self, msg: &str) {
        self.finished = Some((false, msg.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::PromptOption;

    fn prompt(default: Option<&str>) -> Prompt {
        Prompt {
            key: "environment".to_string(),
            question: "Select an environment".to_string(),
            options: vec![
                PromptOption {
                    label: "a".to_string(),
                    value: "/envs/a".to_string(),
                },
                PromptOption {
                    label: "b".to_string(),
                    value: "/envs/b".to_string(),
                },
            ],
            default: default.map(String::from),
        }
    }

    #[test]
    fn captures_messages() {
        let mut ui = MockUI::new();
        ui.message("one");
        ui.success("two");
        ui.warning("three");
        ui.error("four");
        ui.show_hint("five");

        assert!(ui.has_message("one"));
        assert!(ui.has_success("two"));
        assert!(ui.has_warning("three"));
        assert!(ui.has_error("four"));
        assert!(ui.has_hint("five"));
    }

    #[test]
    fn configured_response_wins() {
        let mut ui = MockUI::new();
        ui.set_prompt_response("environment", "/envs/b");

        assert_eq!(ui.prompt(&prompt(Some("/envs/a"))).unwrap(), "/envs/b");
        assert_eq!(ui.prompts_shown().len(), 1);
    }

    #[test]
    fn falls_back_to_default_then_first_option() {
        let mut ui = MockUI::new();

        assert_eq!(ui.prompt(&prompt(Some("/envs/b"))).unwrap(), "/envs/b");
        assert_eq!(ui.prompt(&prompt(None)).unwrap(), "/envs/a");
    }

    #[test]
    fn records_spinners() {
        let mut ui = MockUI::new();
        let mut spinner = ui.start_spinner("Activating");
        spinner.finish_success("Activated");

        assert_eq!(ui.spinners(), &["Activating".to_string()]);
    }

    #[test]
    fn mock_spinner_tracks_finish() {
        let mut spinner = MockSpinner::new();
        spinner.set_message("working");
        spinner.finish_error("failed");

        assert_eq!(spinner.messages(), &["working".to_string()]);
        assert_eq!(spinner.finished(), Some(&(false, "failed".to_string())));
    }
}
