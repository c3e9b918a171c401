//! Environment classification.
//!
//! Registry entries are grouped relative to the current project and the
//! environment manager's root prefix:
//!
//! - **workspace**: the environment lives under the project directory
//! - **global**: the environment lives under the root prefix
//! - **other**: neither (for example an environment created with `-p`
//!   somewhere else on disk)
//!
//! Workspace membership wins when both predicates match. All comparisons run
//! on paths normalized by [`PathNormalizer`], so `C:\Envs\A` and `c:/envs/a`
//! compare equal on case-insensitive filesystems.

use serde::Serialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::shell::is_case_insensitive_fs;

/// Normalizes paths before any prefix or equality comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathNormalizer {
    case_insensitive: bool,
}

impl PathNormalizer {
    /// Normalizer matching the native filesystem's case sensitivity.
    pub fn native() -> Self {
        Self::new(is_case_insensitive_fs())
    }

    /// Normalizer with explicit case handling.
    pub fn new(case_insensitive: bool) -> Self {
        Self { case_insensitive }
    }

    /// Whether this normalizer folds case.
    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Make `path` absolute, resolve `.` and `..` lexically, unify separators,
    /// and fold case on case-insensitive filesystems.
    ///
    /// Normalizing an already normalized path returns it unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// use envsel::environment::PathNormalizer;
    /// use std::path::{Path, PathBuf};
    ///
    /// let normalizer = PathNormalizer::new(false);
    /// assert_eq!(
    ///     normalizer.normalize(Path::new("/opt/micromamba/./envs/../envs/data/")),
    ///     PathBuf::from("/opt/micromamba/envs/data"),
    /// );
    /// ```
    pub fn normalize(&self, path: &Path) -> PathBuf {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
        };

        let mut normalized = PathBuf::new();
        for component in absolute.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                        normalized.pop();
                    }
                }
                other => normalized.push(other.as_os_str()),
            }
        }

        if self.case_insensitive {
            PathBuf::from(normalized.to_string_lossy().to_lowercase())
        } else {
            normalized
        }
    }
}

impl Default for PathNormalizer {
    fn default() -> Self {
        Self::native()
    }
}

/// Which picker group an environment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentGroup {
    Workspace,
    Global,
    Other,
}

impl fmt::Display for EnvironmentGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Workspace => write!(f, "workspace"),
            Self::Global => write!(f, "global"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// One environment listed in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentEntry {
    /// Path as written in the registry.
    pub path: PathBuf,

    /// Path after normalization, used for every comparison.
    #[serde(skip)]
    pub normalized: PathBuf,

    /// Directory name shown in the picker.
    pub display_name: String,
}

impl EnvironmentEntry {
    /// Build an entry from a raw registry line.
    pub fn new(raw: &str, normalizer: &PathNormalizer) -> Self {
        let path = PathBuf::from(raw);
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| raw.to_string());

        Self {
            normalized: normalizer.normalize(&path),
            path,
            display_name,
        }
    }
}

/// Registry entries partitioned into disjoint groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub workspace: Vec<EnvironmentEntry>,
    pub global: Vec<EnvironmentEntry>,
    pub other: Vec<EnvironmentEntry>,
    pub active: Option<EnvironmentEntry>,

    /// Group and index of the one entry marked active.
    #[serde(skip)]
    active_slot: Option<(EnvironmentGroup, usize)>,
}

impl Classification {
    /// Total number of selectable environments.
    pub fn len(&self) -> usize {
        self.workspace.len() + self.global.len() + self.other.len()
    }

    /// Whether there is nothing to select.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries in picker order (workspace, global, other) with their group.
    pub fn entries(&self) -> impl Iterator<Item = (EnvironmentGroup, &EnvironmentEntry)> {
        self.workspace
            .iter()
            .map(|e| (EnvironmentGroup::Workspace, e))
            .chain(self.global.iter().map(|e| (EnvironmentGroup::Global, e)))
            .chain(self.other.iter().map(|e| (EnvironmentGroup::Other, e)))
    }

    /// Entries of one group.
    pub fn group(&self, group: EnvironmentGroup) -> &[EnvironmentEntry] {
        match group {
            EnvironmentGroup::Workspace => &self.workspace,
            EnvironmentGroup::Global => &self.global,
            EnvironmentGroup::Other => &self.other,
        }
    }

    /// Whether `entry` is the active environment.
    ///
    /// Only the registry line chosen during classification qualifies, so a
    /// duplicated registry line is never marked active twice. `entry` must be
    /// borrowed from this classification.
    pub fn is_active(&self, entry: &EnvironmentEntry) -> bool {
        self.active_slot
            .and_then(|(group, index)| self.group(group).get(index))
            .is_some_and(|active| std::ptr::eq(active, entry))
    }
}

/// Partitions registry entries relative to a project and a root prefix.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentClassifier {
    normalizer: PathNormalizer,
}

impl EnvironmentClassifier {
    /// Create a classifier using the given normalizer.
    pub fn new(normalizer: PathNormalizer) -> Self {
        Self { normalizer }
    }

    /// The normalizer applied to every compared path.
    pub fn normalizer(&self) -> &PathNormalizer {
        &self.normalizer
    }

    /// Classify `entries`, preserving their order within each group.
    ///
    /// # Example
    ///
    /// ```
    /// use envsel::environment::{EnvironmentClassifier, PathNormalizer};
    /// use std::path::Path;
    ///
    /// let classifier = EnvironmentClassifier::new(PathNormalizer::new(false));
    /// let entries = vec![
    ///     "/home/u/proj/.conda/envB".to_string(),
    ///     "/opt/micromamba/envs/envA".to_string(),
    /// ];
    /// let classification = classifier.classify(
    ///     &entries,
    ///     Some(Path::new("/home/u/proj")),
    ///     Some(Path::new("/opt/micromamba")),
    ///     None,
    /// );
    /// assert_eq!(classification.workspace[0].display_name, "envB");
    /// assert_eq!(classification.global[0].display_name, "envA");
    /// assert!(classification.active.is_none());
    /// ```
    pub fn classify(
        &self,
        entries: &[String],
        workspace_root: Option<&Path>,
        root_prefix: Option<&Path>,
        active_path: Option<&Path>,
    ) -> Classification {
        let workspace_root = workspace_root.map(|p| self.normalizer.normalize(p));
        let root_prefix = root_prefix.map(|p| self.normalizer.normalize(p));
        let active_path = active_path.map(|p| self.normalizer.normalize(p));

        let mut classification = Classification::default();

        for raw in entries {
            let entry = EnvironmentEntry::new(raw, &self.normalizer);

            let group = if is_under(&entry.normalized, workspace_root.as_deref()) {
                EnvironmentGroup::Workspace
            } else if is_under(&entry.normalized, root_prefix.as_deref()) {
                EnvironmentGroup::Global
            } else {
                EnvironmentGroup::Other
            };

            if classification.active.is_none()
                && active_path.as_ref() == Some(&entry.normalized)
            {
                classification.active = Some(entry.clone());
                classification.active_slot = Some((group, classification.group(group).len()));
            }

            match group {
                EnvironmentGroup::Workspace => classification.workspace.push(entry),
                EnvironmentGroup::Global => classification.global.push(entry),
                EnvironmentGroup::Other => classification.other.push(entry),
            }
        }

        tracing::debug!(
            "Classified {} workspace, {} global, {} other environments",
            classification.workspace.len(),
            classification.global.len(),
            classification.other.len()
        );
        classification
    }
}

fn is_under(path: &Path, root: Option<&Path>) -> bool {
    root.is_some_and(|root| path.starts_with(root))
}
