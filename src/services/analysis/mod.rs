//! Analysis Service
//!
//! Runs the external analyzer against a target, tracks the live run,
//! caches parsed diagnostics and builds display trees from them.

pub mod cache;
pub mod process;
pub mod service;
pub mod supervisor;

pub use cache::{CacheEntry, ResultCache, FORMAT_VERSION};
pub use process::{
    AnalyzerExecutor, AnalyzerProcess, ChildProcess, LaunchedProcess, ProcessEvent,
    ProcessLauncher, SpawnConfig,
};
pub use service::{AnalysisReport, AnalysisService};
pub use supervisor::{AnalysisRunSupervisor, RunCompletion, RunHandle, RunState};
