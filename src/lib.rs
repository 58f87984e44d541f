//! lintview - Static Analysis Result Browser
//!
//! This library runs an external static analyzer against a Python module or
//! package and turns its output into browsable results. It includes:
//! - Run supervision over an asynchronous child process
//! - A bounded, persisted result cache
//! - Settings and config storage
//! - Data models and utilities
//!
//! Parsing and tree building live in `lintview-diagnostics`.

pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use models::settings::{AnalyzerSettings, SettingsUpdate};
pub use services::analysis::{
    AnalysisReport, AnalysisRunSupervisor, AnalysisService, AnalyzerExecutor, ProcessEvent,
    ProcessLauncher, ResultCache, RunCompletion, RunHandle, RunState,
};
pub use storage::config::ConfigService;
pub use utils::error::{AppError, AppResult};
