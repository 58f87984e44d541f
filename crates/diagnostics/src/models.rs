//! Diagnostic Models
//!
//! Data structures for analysis targets and the diagnostics an analyzer reports
//! about them.

use std::path::{Component, Path, PathBuf};

use lintview_core::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Severity class of a diagnostic.
///
/// Only convention-class findings are reported today; new classes get their own
/// category node in the tree as soon as they are added to `ALL`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Coding-standard violations
    #[default]
    Convention,
}

impl Severity {
    /// Every severity class, in display order.
    pub const ALL: [Severity; 1] = [Severity::Convention];

    /// Get human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Severity::Convention => "Convention",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Whether a target is a single module file or a directory/package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    File,
    Package,
}

impl TargetKind {
    /// Detect the kind from the filesystem. Anything that is not a directory
    /// (including a path that does not exist yet) counts as a file.
    pub fn detect(path: &Path) -> Self {
        if path.is_dir() {
            TargetKind::Package
        } else {
            TargetKind::File
        }
    }
}

/// An absolute, normalized path identifying what was analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    path: PathBuf,
    kind: TargetKind,
}

impl Target {
    /// Create a target, normalizing the path and detecting its kind.
    pub fn new(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = normalize_path(path.as_ref())?;
        let kind = TargetKind::detect(&path);
        Ok(Self { path, kind })
    }

    /// Create a target with an explicit kind, without touching the filesystem
    /// beyond resolving a relative path.
    pub fn with_kind(path: impl AsRef<Path>, kind: TargetKind) -> CoreResult<Self> {
        let path = normalize_path(path.as_ref())?;
        Ok(Self { path, kind })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    pub fn is_package(&self) -> bool {
        self.kind == TargetKind::Package
    }

    /// Containing directory; the analyzer runs there and module names resolve
    /// against it.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or(&self.path)
    }

    /// File name without its extension (`foo` for `/proj/foo.py`, `pkg` for
    /// `/proj/pkg`).
    pub fn base_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// One finding reported by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticRecord {
    /// Resolved source path of the reporting module
    pub module: String,
    /// Line number
    pub line: u32,
    /// Message text
    pub message: String,
    /// Message identifier, may be empty
    #[serde(default)]
    pub id: String,
    /// Severity class
    #[serde(default)]
    pub severity: Severity,
}

impl DiagnosticRecord {
    /// Create a convention-class record
    pub fn new(
        module: impl Into<String>,
        line: u32,
        message: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            line,
            message: message.into(),
            id: id.into(),
            severity: Severity::Convention,
        }
    }

    /// Set severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn module_path(&self) -> &Path {
        Path::new(&self.module)
    }
}

/// Make a path absolute and lexically normalized (`.` dropped, `..` folded).
///
/// Symlinks are not resolved, so a path that does not exist yet normalizes too.
pub fn normalize_path(path: &Path) -> CoreResult<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(CoreError::validation("target path is empty"));
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `pop` refuses to remove the root, matching `/..` == `/`
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}
