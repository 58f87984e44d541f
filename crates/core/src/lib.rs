//! Lintview Core
//!
//! Foundational error types and the navigation contract for the lintview
//! workspace. This crate depends on nothing else in the workspace.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `navigation` - Source locations (`NavigationRef`) and the editor-side `NavigationSink` trait

pub mod error;
pub mod navigation;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Navigation ─────────────────────────────────────────────────────────
pub use navigation::{NavigationRef, NavigationSink, RecordingSink};
