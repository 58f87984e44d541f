//! Result Cache
//!
//! Most-recent-first store of the last diagnostics per target, persisted as
//! a JSON array:
//!
//! ```text
//! ["1", ["/proj/foo.py", [{...}, ...]], ["/proj/pkg", [...]], ...]
//! ```
//!
//! The first element is the format version. The file is loaded on first
//! access and rewritten after every mutation.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use lintview_diagnostics::{normalize_path, DiagnosticRecord};

use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::ensure_parent_dir;

/// Version tag written as the first array element
pub const FORMAT_VERSION: &str = "1";

/// Diagnostics recorded for one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub target: PathBuf,
    pub diagnostics: Vec<DiagnosticRecord>,
}

/// Bounded, persisted cache of analysis results
#[derive(Debug)]
pub struct ResultCache {
    path: PathBuf,
    max_entries: usize,
    entries: Option<Vec<CacheEntry>>,
}

impl ResultCache {
    /// Create a cache backed by `path`; nothing is read until first use
    pub fn new(path: impl Into<PathBuf>, max_entries: usize) -> Self {
        Self {
            path: path.into(),
            max_entries: max_entries.max(1),
            entries: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    fn entries(&mut self) -> &mut Vec<CacheEntry> {
        let path = &self.path;
        let max_entries = self.max_entries;
        self.entries
            .get_or_insert_with(|| load_entries(path, max_entries))
    }

    /// Diagnostics last recorded for `target`
    pub fn get(&mut self, target: &Path) -> AppResult<Option<Vec<DiagnosticRecord>>> {
        let target = normalize_path(target)?;
        Ok(self
            .entries()
            .iter()
            .find(|entry| entry.target == target)
            .map(|entry| entry.diagnostics.clone()))
    }

    /// Record `diagnostics` as the newest entry for `target`.
    ///
    /// The in-memory store only changes once the new state is on disk.
    pub fn set(&mut self, target: &Path, diagnostics: Vec<DiagnosticRecord>) -> AppResult<()> {
        let target = normalize_path(target)?;
        let max_entries = self.max_entries;

        let mut updated = self.entries().clone();
        updated.retain(|entry| entry.target != target);
        updated.insert(0, CacheEntry {
            target,
            diagnostics,
        });
        while updated.len() > max_entries {
            if let Some(evicted) = updated.pop() {
                debug!("Evicted cached result for {}", evicted.target.display());
            }
        }

        self.persist(&updated)?;
        self.entries = Some(updated);
        Ok(())
    }

    /// Remove every entry whose target fails `is_valid`; returns how many were removed
    pub fn prune_obsolete<F>(&mut self, is_valid: F) -> AppResult<usize>
    where
        F: Fn(&Path) -> bool,
    {
        let mut updated = self.entries().clone();
        let before = updated.len();
        updated.retain(|entry| {
            let keep = is_valid(&entry.target);
            if !keep {
                debug!("Dropping obsolete target {}", entry.target.display());
            }
            keep
        });
        let removed = before - updated.len();

        if removed > 0 {
            self.persist(&updated)?;
            info!("Pruned {} obsolete cached results", removed);
            self.entries = Some(updated);
        }
        Ok(removed)
    }

    /// Cached targets, most recent first
    pub fn targets(&mut self) -> Vec<PathBuf> {
        self.entries().iter().map(|entry| entry.target.clone()).collect()
    }

    pub fn len(&mut self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.entries().is_empty()
    }

    /// Write `entries` atomically: temp sibling first, then rename
    fn persist(&self, entries: &[CacheEntry]) -> AppResult<()> {
        let content = encode(entries)?;

        ensure_parent_dir(&self.path)?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;

        debug!("Persisted result cache to {}", self.path.display());
        Ok(())
    }
}

fn encode(entries: &[CacheEntry]) -> AppResult<String> {
    let mut items = Vec::with_capacity(entries.len() + 1);
    items.push(Value::String(FORMAT_VERSION.to_string()));
    for entry in entries {
        items.push(serde_json::to_value((&entry.target, &entry.diagnostics))?);
    }
    Ok(serde_json::to_string(&Value::Array(items))?)
}

fn decode(content: &str) -> AppResult<Vec<CacheEntry>> {
    let items: Vec<Value> = serde_json::from_str(content)?;
    let mut items = items.into_iter();

    match items.next() {
        Some(Value::String(version)) if version == FORMAT_VERSION => {}
        Some(other) => {
            return Err(AppError::validation(format!(
                "Unsupported result cache version: {}",
                other
            )))
        }
        None => return Err(AppError::validation("Result cache has no version tag")),
    }

    items
        .map(|item| {
            let (target, diagnostics): (PathBuf, Vec<DiagnosticRecord>) =
                serde_json::from_value(item)?;
            Ok(CacheEntry {
                target,
                diagnostics,
            })
        })
        .collect()
}

/// Load the store; any failure yields an empty store
fn load_entries(path: &Path, max_entries: usize) -> Vec<CacheEntry> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No result cache at {}", path.display());
            return Vec::new();
        }
        Err(e) => {
            warn!("Failed to read result cache {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let mut entries = match decode(&content) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Discarding result cache {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    entries.retain(|entry| seen.insert(entry.target.clone()));
    entries.truncate(max_entries);
    entries
}
