//! Analysis Service
//!
//! Caller-facing entry point: runs the analyzer, feeds parsed results into
//! the cache and builds display trees.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use lintview_core::{NavigationRef, NavigationSink};
use lintview_diagnostics::{
    is_module_or_package, DiagnosticRecord, DiagnosticTree, DiagnosticTreeBuilder, MessageNode,
    Target,
};

use crate::models::settings::AnalyzerSettings;
use crate::services::analysis::cache::ResultCache;
use crate::services::analysis::process::{AnalyzerExecutor, ProcessLauncher};
use crate::services::analysis::supervisor::{AnalysisRunSupervisor, RunCompletion, RunHandle, RunState};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::results_path;

/// Outcome of a successfully parsed run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub target: PathBuf,
    pub exit_code: Option<i32>,
    pub diagnostics: Vec<DiagnosticRecord>,
    pub tree: DiagnosticTree,
}

pub struct AnalysisService {
    supervisor: AnalysisRunSupervisor,
    cache: ResultCache,
    builder: DiagnosticTreeBuilder,
    navigation: Option<Arc<dyn NavigationSink>>,
}

impl AnalysisService {
    /// Create a service that launches real analyzer processes
    pub fn new(settings: AnalyzerSettings) -> AppResult<Self> {
        Self::with_launcher(settings, Arc::new(AnalyzerExecutor::new()))
    }

    /// Create a service with a custom process launcher.
    ///
    /// Cached targets that are no longer modules or packages are dropped here.
    pub fn with_launcher(
        settings: AnalyzerSettings,
        launcher: Arc<dyn ProcessLauncher>,
    ) -> AppResult<Self> {
        settings.validate().map_err(AppError::config)?;
        let results_file = match &settings.results_file {
            Some(path) => path.clone(),
            None => results_path()?,
        };
        let mut cache = ResultCache::new(results_file, settings.max_entries);
        if let Err(e) = cache.prune_obsolete(is_module_or_package) {
            warn!("Failed to prune obsolete cached results: {}", e);
        }

        Ok(Self {
            supervisor: AnalysisRunSupervisor::new(launcher, settings),
            cache,
            builder: DiagnosticTreeBuilder::new(),
            navigation: None,
        })
    }

    /// Attach the sink that receives navigation requests
    pub fn with_navigation(mut self, sink: Arc<dyn NavigationSink>) -> Self {
        self.navigation = Some(sink);
        self
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        self.supervisor.settings()
    }

    pub fn run_state(&self) -> RunState {
        self.supervisor.state()
    }

    /// Start analyzing `target`, replacing any run in progress
    pub async fn analyze(&mut self, target: impl AsRef<Path>) -> AppResult<RunHandle> {
        let target = Target::new(target)?;
        self.supervisor.start(target).await
    }

    /// Wait for the current run and commit its results.
    ///
    /// Parsed output is cached and returned with its tree. Error-only output
    /// fails the run and leaves the cache alone. `None` when the run produced
    /// nothing or there is no run.
    pub async fn wait_for_completion(&mut self) -> AppResult<Option<AnalysisReport>> {
        match self.supervisor.next_completion().await {
            None => Ok(None),
            Some(RunCompletion::NoOutput { target, exit_code }) => {
                info!("No output for {} (exit code {:?})", target, exit_code);
                Ok(None)
            }
            Some(RunCompletion::ErrorOnly { target, stderr, .. }) => {
                warn!("Analysis of {} failed", target);
                Err(AppError::run_failure(stderr))
            }
            Some(RunCompletion::Parsed {
                target,
                diagnostics,
                exit_code,
            }) => {
                self.cache.set(target.path(), diagnostics.clone())?;
                let tree = self.builder.build(&target, &diagnostics);
                Ok(Some(AnalysisReport {
                    target: target.path().to_path_buf(),
                    exit_code,
                    diagnostics,
                    tree,
                }))
            }
        }
    }

    pub async fn cancel_current_run(&mut self) -> AppResult<()> {
        self.supervisor.cancel().await
    }

    pub fn is_running(&self) -> bool {
        self.supervisor.is_running()
    }

    /// Diagnostics from the last successful run on `target`
    pub fn get_cached_diagnostics(
        &mut self,
        target: impl AsRef<Path>,
    ) -> AppResult<Option<Vec<DiagnosticRecord>>> {
        self.cache.get(target.as_ref())
    }

    /// Display tree for the cached result of `target`
    pub fn get_display_tree(&mut self, target: impl AsRef<Path>) -> AppResult<DiagnosticTree> {
        let target = Target::new(target)?;
        let diagnostics = self
            .cache
            .get(target.path())?
            .ok_or_else(|| AppError::no_result(target.path().display().to_string()))?;
        Ok(self.builder.build(&target, &diagnostics))
    }

    /// Error output then standard output of the last run
    pub fn get_combined_log(&self) -> Option<String> {
        self.supervisor.combined_log()
    }

    /// Cached targets, most recent first
    pub fn history(&mut self) -> Vec<PathBuf> {
        self.cache.targets()
    }

    /// Drop cached results for targets that are no longer modules or packages
    pub fn prune_obsolete(&mut self) -> AppResult<usize> {
        self.cache.prune_obsolete(is_module_or_package)
    }

    /// Forward a message's location to the navigation sink
    pub fn activate(&self, node: &MessageNode) -> NavigationRef {
        let target = node.navigation.clone();
        if let Some(sink) = &self.navigation {
            sink.goto(&target.path, target.line);
        }
        target
    }
}
