//! Navigation Contract
//!
//! A diagnostic in the tree points back at a source location. The core never
//! opens an editor itself; it hands a `NavigationRef` to whatever `NavigationSink`
//! the host registered.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Resolved source location a message node points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationRef {
    /// Resolved module path
    pub path: PathBuf,
    /// Line number as reported by the analyzer
    pub line: u32,
}

impl NavigationRef {
    pub fn new(path: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }
}

impl std::fmt::Display for NavigationRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

/// Receiver of "go to this location" requests, implemented by the editor host.
pub trait NavigationSink: Send + Sync {
    fn goto(&self, path: &Path, line: u32);
}

/// Sink that records every request. Handy for hosts that poll, and for tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    requests: Mutex<Vec<NavigationRef>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<NavigationRef> {
        match self.requests.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl NavigationSink for RecordingSink {
    fn goto(&self, path: &Path, line: u32) {
        let request = NavigationRef::new(path, line);
        match self.requests.lock() {
            Ok(mut guard) => guard.push(request),
            Err(poisoned) => poisoned.into_inner().push(request),
        }
    }
}
