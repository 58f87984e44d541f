//! Lintview Diagnostics
//!
//! Target and diagnostic types, analyzer output parsing, module resolution and
//! display-tree construction. Everything here is synchronous and free of
//! process handling, so it can be tested against in-memory filesystems:
//!
//! - `models` - Targets and diagnostic records (Target, TargetKind, DiagnosticRecord, Severity)
//! - `detector` - Module/package detection and the `PathProbe` filesystem seam
//! - `resolver` - Heuristic module identifier → source path resolution
//! - `parser` - Line-oriented extraction of diagnostics from analyzer output
//! - `tree` - Severity → module → message display hierarchy
//!
//! Process supervision and the persistent result cache live in the main crate's
//! `services::analysis` module.

pub mod detector;
pub mod models;
pub mod parser;
pub mod resolver;
pub mod tree;

// Re-export core model types
pub use models::{normalize_path, DiagnosticRecord, Severity, Target, TargetKind};

// Re-export detector
pub use detector::{
    is_module_or_package, MemoryFs, PathProbe, RealFs, TargetDetection, TargetDetector,
};

// Re-export parsing
pub use parser::{OutputParser, DEFAULT_MARKER};
pub use resolver::resolve_module;

// Re-export tree types
pub use tree::{
    CategoryNode, DiagnosticTree, DiagnosticTreeBuilder, DiagnosticTreeNode, MessageNode,
    ModuleNode,
};
