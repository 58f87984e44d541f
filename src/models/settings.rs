//! Settings Models
//!
//! Analyzer configuration and settings data structures.

use std::path::PathBuf;

use lintview_diagnostics::DEFAULT_MARKER;
use serde::{Deserialize, Serialize};

/// Upper bound for `max_entries`
pub const MAX_ENTRIES_LIMIT: usize = 1000;

/// Analyzer configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerSettings {
    /// Interpreter executable that runs the analyzer
    pub interpreter: String,
    /// Arguments passed before the target path
    pub args: Vec<String>,
    /// Append the target path as the last argument
    #[serde(default = "default_pass_target")]
    pub pass_target: bool,
    /// Maximum number of targets kept in the result cache
    pub max_entries: usize,
    /// Token that introduces a diagnostic message in the analyzer output
    #[serde(default = "default_marker")]
    pub marker: String,
    /// Result cache location; defaults to ~/.lintview/results.json
    #[serde(default)]
    pub results_file: Option<PathBuf>,
}

fn default_pass_target() -> bool {
    true
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            args: vec![
                "-m".to_string(),
                "pylint".to_string(),
                "--msg-template={path}:{line}:{msg_id}: message: {msg}".to_string(),
            ],
            pass_target: true,
            max_entries: 100,
            marker: DEFAULT_MARKER.to_string(),
            results_file: None,
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub interpreter: Option<String>,
    pub args: Option<Vec<String>>,
    pub pass_target: Option<bool>,
    pub max_entries: Option<usize>,
    pub marker: Option<String>,
    pub results_file: Option<PathBuf>,
}

impl AnalyzerSettings {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(interpreter) = update.interpreter {
            self.interpreter = interpreter;
        }
        if let Some(args) = update.args {
            self.args = args;
        }
        if let Some(pass_target) = update.pass_target {
            self.pass_target = pass_target;
        }
        if let Some(max) = update.max_entries {
            self.max_entries = max;
        }
        if let Some(marker) = update.marker {
            self.marker = marker;
        }
        if let Some(results_file) = update.results_file {
            self.results_file = Some(results_file);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.interpreter.trim().is_empty() {
            return Err("interpreter must not be empty".to_string());
        }

        if self.marker.trim().is_empty() {
            return Err("marker must not be empty".to_string());
        }

        if self.max_entries == 0 {
            return Err("max_entries must be at least 1".to_string());
        }

        if self.max_entries > MAX_ENTRIES_LIMIT {
            return Err(format!("max_entries cannot exceed {}", MAX_ENTRIES_LIMIT));
        }

        Ok(())
    }
}
