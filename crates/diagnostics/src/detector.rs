//! Target Detection
//!
//! Decides whether a path is something the analyzer can run on: a Python
//! module file, or a package directory carrying an `__init__.py`.
//!
//! Filesystem access goes through `PathProbe` so module resolution can be
//! exercised against an in-memory layout.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::models::TargetKind;

/// File extensions recognized as analyzable modules
pub const MODULE_EXTENSIONS: [&str; 2] = ["py", "pyw"];

/// Package marker file stem
pub const PACKAGE_INIT: &str = "__init__";

/// Read-only view of the filesystem.
pub trait PathProbe {
    fn is_dir(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
}

/// Probe backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl PathProbe for RealFs {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// In-memory probe: a fixed set of files, with every ancestor counted as a
/// directory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    files: HashSet<PathBuf>,
    dirs: HashSet<PathBuf>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file and register its ancestors as directories
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
        self.files.insert(path);
        self
    }

    /// Add an empty directory
    pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.dirs.insert(path.into());
        self
    }
}

impl PathProbe for MemoryFs {
    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains(path)
    }
}

/// Whether the path carries one of the module extensions.
pub fn has_module_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MODULE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Target detection result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDetection {
    /// File or package
    pub kind: TargetKind,
    /// Whether the analyzer can run on the path
    pub analyzable: bool,
    /// The module file the analyzer starts from (`__init__.py` for packages)
    pub entry_file: Option<PathBuf>,
}

/// Target detector
#[derive(Debug, Clone, Default)]
pub struct TargetDetector<P = RealFs> {
    probe: P,
}

impl TargetDetector<RealFs> {
    /// Create a detector over the real filesystem
    pub fn new() -> Self {
        Self { probe: RealFs }
    }
}

impl<P: PathProbe> TargetDetector<P> {
    /// Create a detector over a custom probe
    pub fn with_probe(probe: P) -> Self {
        Self { probe }
    }

    /// Detect what the path is and whether it can be analyzed
    pub fn detect(&self, path: &Path) -> TargetDetection {
        if self.probe.is_dir(path) {
            let entry_file = MODULE_EXTENSIONS
                .iter()
                .map(|ext| path.join(format!("{PACKAGE_INIT}.{ext}")))
                .find(|candidate| self.probe.is_file(candidate));
            // Only `__init__.py` makes a package importable
            let analyzable = self.probe.is_file(&path.join(format!("{PACKAGE_INIT}.py")));
            return TargetDetection {
                kind: TargetKind::Package,
                analyzable,
                entry_file,
            };
        }

        let analyzable = self.probe.is_file(path) && has_module_extension(path);
        TargetDetection {
            kind: TargetKind::File,
            analyzable,
            entry_file: analyzable.then(|| path.to_path_buf()),
        }
    }

    /// True for an existing module file or a package directory
    pub fn is_module_or_package(&self, path: &Path) -> bool {
        self.detect(path).analyzable
    }

    /// Access the underlying probe
    pub fn probe(&self) -> &P {
        &self.probe
    }
}

/// Check a path against the real filesystem
pub fn is_module_or_package(path: &Path) -> bool {
    TargetDetector::new().is_module_or_package(path)
}
