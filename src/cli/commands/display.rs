//! Shared display helpers for environment listings.
//!
//! Used by `list` for its output and by `select` for picker labels so both
//! render environments the same way.

use std::path::Path;

use crate::environment::{Classification, EnvironmentEntry, EnvironmentGroup, PathNormalizer};
use crate::error::EnvselError;
use crate::ui::{should_use_colors, EnvselTheme, PromptOption, UserInterface};

/// Theme for command output, plain when colors are off.
pub fn theme() -> EnvselTheme {
    if should_use_colors() {
        EnvselTheme::new()
    } else {
        EnvselTheme::plain()
    }
}

/// Title shown above a group of environments.
pub fn group_title(group: EnvironmentGroup) -> &'static str {
    match group {
        EnvironmentGroup::Workspace => "Workspace environments",
        EnvironmentGroup::Global => "Global environments",
        EnvironmentGroup::Other => "Other environments",
    }
}

/// One line describing an environment.
pub fn environment_line(
    theme: &EnvselTheme,
    group: EnvironmentGroup,
    entry: &EnvironmentEntry,
    active: bool,
) -> String {
    theme.format_environment(
        group,
        &entry.display_name,
        &entry.path.to_string_lossy(),
        active,
    )
}

/// Picker options in workspace, global, other order.
pub fn picker_options(theme: &EnvselTheme, classification: &Classification) -> Vec<PromptOption> {
    classification
        .entries()
        .map(|(group, entry)| PromptOption {
            label: environment_line(theme, group, entry, classification.is_active(entry)),
            value: entry.path.to_string_lossy().to_string(),
        })
        .collect()
}

/// Find the entry a user answer refers to.
///
/// Accepts the registry path as written, any spelling that normalizes to the
/// same path, or an environment's directory name.
pub fn find_entry<'a>(
    classification: &'a Classification,
    answer: &str,
) -> Option<&'a EnvironmentEntry> {
    let answer = answer.trim();
    if answer.is_empty() {
        return None;
    }

    let entries: Vec<&EnvironmentEntry> = classification.entries().map(|(_, e)| e).collect();

    if let Some(entry) = entries.iter().copied().find(|e| e.path == Path::new(answer)) {
        return Some(entry);
    }

    if answer.contains(['/', '\\']) {
        let normalized = PathNormalizer::native().normalize(Path::new(answer));
        if let Some(entry) = entries.iter().copied().find(|e| e.normalized == normalized) {
            return Some(entry);
        }
    }

    entries.into_iter().find(|e| e.display_name == answer)
}

/// Report a missing registry with a pointer to the setting.
pub fn show_registry_error(ui: &mut dyn UserInterface, error: &EnvselError) {
    ui.error(&error.to_string());
    ui.show_hint("Set registry_file in .envsel/config.yml if your environments are listed elsewhere.");
}
