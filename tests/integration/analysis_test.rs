//! Analysis Service Integration Tests
//!
//! Drives the service through a scripted launcher that replays a fixed set
//! of process events, plus a real shell run on unix.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::mpsc;

use lintview::services::analysis::{
    AnalyzerProcess, LaunchedProcess, ProcessEvent, ProcessLauncher, SpawnConfig,
};
use lintview::{AnalysisService, AnalyzerSettings, AppError, AppResult, RunState};
use lintview_core::{NavigationRef, RecordingSink};
use lintview_diagnostics::{DiagnosticRecord, DiagnosticTreeNode};

// ============================================================================
// Scripted launcher
// ============================================================================

struct ScriptedProcess {
    killed: Arc<AtomicBool>,
}

#[async_trait]
impl AnalyzerProcess for ScriptedProcess {
    fn pid(&self) -> Option<u32> {
        None
    }

    async fn kill(&mut self) -> AppResult<()> {
        self.killed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Replays `events` on every launch. Without an `Exited` event the run
/// stays live until cancelled.
struct ScriptedLauncher {
    events: Vec<ProcessEvent>,
    killed: Arc<AtomicBool>,
    configs: Mutex<Vec<SpawnConfig>>,
    // Keeps the stream open for runs that never exit
    open: Mutex<Vec<mpsc::UnboundedSender<ProcessEvent>>>,
}

impl ScriptedLauncher {
    fn new(events: Vec<ProcessEvent>) -> Arc<Self> {
        Arc::new(Self {
            events,
            killed: Arc::new(AtomicBool::new(false)),
            configs: Mutex::new(Vec::new()),
            open: Mutex::new(Vec::new()),
        })
    }

    fn stdout(text: &str, exit_code: i32) -> Arc<Self> {
        Self::new(vec![
            ProcessEvent::Stdout(text.as_bytes().to_vec()),
            ProcessEvent::Exited(Some(exit_code)),
        ])
    }

    fn was_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessLauncher for ScriptedLauncher {
    async fn launch(&self, config: &SpawnConfig) -> AppResult<LaunchedProcess> {
        self.configs.lock().unwrap().push(config.clone());
        let (tx, events) = mpsc::unbounded_channel();
        for event in &self.events {
            tx.send(event.clone()).unwrap();
        }
        self.open.lock().unwrap().push(tx);
        Ok(LaunchedProcess {
            process: Box::new(ScriptedProcess {
                killed: self.killed.clone(),
            }),
            events,
        })
    }
}

fn settings(dir: &TempDir) -> AnalyzerSettings {
    AnalyzerSettings {
        results_file: Some(dir.path().join("results.json")),
        ..Default::default()
    }
}

fn service(dir: &TempDir, launcher: Arc<ScriptedLauncher>) -> AnalysisService {
    AnalysisService::with_launcher(settings(dir), launcher).unwrap()
}

// ============================================================================
// Run outcomes
// ============================================================================

#[tokio::test]
async fn test_single_diagnostic_scenario() {
    let dir = TempDir::new().unwrap();
    let launcher = ScriptedLauncher::stdout("foo:10:C1: message: bad style\n", 16);
    let mut service = service(&dir, launcher.clone());

    let handle = service.analyze("/proj/foo.py").await.unwrap();
    assert_eq!(handle.target.path(), Path::new("/proj/foo.py"));
    assert!(service.is_running());

    let report = service.wait_for_completion().await.unwrap().unwrap();

    let expected = DiagnosticRecord::new("/proj/foo.py", 10, "bad style", "C1");
    assert_eq!(report.diagnostics, vec![expected.clone()]);
    assert_eq!(report.exit_code, Some(16));
    assert_eq!(report.tree.title, "Results for /proj/foo.py");

    let category = report.tree.categories().next().unwrap();
    assert_eq!(category.label, "Convention (1 message)");
    assert!(!category.disabled);
    match category.children.as_slice() {
        [DiagnosticTreeNode::Message(message)] => {
            assert_eq!(message.text, "[C1] 10 : bad style");
            assert_eq!(message.navigation, NavigationRef::new("/proj/foo.py", 10));
        }
        other => panic!("unexpected children: {:?}", other),
    }

    assert_eq!(
        service.get_cached_diagnostics("/proj/foo.py").unwrap(),
        Some(vec![expected])
    );
    assert!(!service.is_running());

    let configs = launcher.configs.lock().unwrap();
    assert_eq!(configs[0].working_dir, PathBuf::from("/proj"));
    assert_eq!(configs[0].args.last().map(String::as_str), Some("/proj/foo.py"));
}

#[tokio::test]
async fn test_error_only_run_leaves_cache_untouched() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("foo.py");
    fs::write(&target, "").unwrap();
    let mut seeded = service(&dir, ScriptedLauncher::stdout("foo:3:C2: message: old\n", 0));
    seeded.analyze(&target).await.unwrap();
    let previous = seeded.wait_for_completion().await.unwrap().unwrap();

    let launcher = ScriptedLauncher::new(vec![
        ProcessEvent::Stderr(b"boom".to_vec()),
        ProcessEvent::Exited(Some(1)),
    ]);
    let mut service = service(&dir, launcher);
    service.analyze(&target).await.unwrap();

    let err = service.wait_for_completion().await.unwrap_err();

    assert!(matches!(&err, AppError::RunFailure(stderr) if stderr == "boom"));
    assert_eq!(
        service.get_cached_diagnostics(&target).unwrap(),
        Some(previous.diagnostics)
    );
    assert_eq!(service.get_combined_log().as_deref(), Some("boom"));
}

#[tokio::test]
async fn test_no_output_run() {
    let dir = TempDir::new().unwrap();
    let launcher = ScriptedLauncher::new(vec![ProcessEvent::Exited(Some(0))]);
    let mut service = service(&dir, launcher);

    service.analyze("/proj/foo.py").await.unwrap();

    assert!(service.wait_for_completion().await.unwrap().is_none());
    assert!(service.history().is_empty());
    assert_eq!(
        service.run_state(),
        RunState::Finished {
            exit_code: Some(0),
            had_output: false
        }
    );
}

#[tokio::test]
async fn test_unparseable_output_caches_empty_result() {
    let dir = TempDir::new().unwrap();
    let launcher = ScriptedLauncher::stdout("Your code has been rated at 10.00/10\n", 0);
    let mut service = service(&dir, launcher);

    service.analyze("/proj/foo.py").await.unwrap();
    let report = service.wait_for_completion().await.unwrap().unwrap();

    assert!(report.diagnostics.is_empty());
    let category = report.tree.categories().next().unwrap();
    assert_eq!(category.label, "Convention (0 messages)");
    assert!(category.disabled);
    assert_eq!(service.get_cached_diagnostics("/proj/foo.py").unwrap(), Some(vec![]));
}

#[tokio::test]
async fn test_package_groups_by_module() {
    let dir = TempDir::new().unwrap();
    let pkg = dir.path().join("pkg");
    fs::create_dir(&pkg).unwrap();
    for name in ["__init__.py", "a.py", "b.py"] {
        fs::write(pkg.join(name), "").unwrap();
    }

    let output = "\
************* Module pkg.a
pkg.a:1:C0114: message: missing module docstring
pkg.b:2:C0103: message: invalid name
pkg.a:3:C0301: message: line too long
";
    let mut service = service(&dir, ScriptedLauncher::stdout(output, 16));

    service.analyze(&pkg).await.unwrap();
    let report = service.wait_for_completion().await.unwrap().unwrap();

    assert_eq!(report.diagnostics.len(), 3);
    let category = report.tree.categories().next().unwrap();
    assert_eq!(category.label, "Convention (3 messages)");

    let modules: Vec<_> = category
        .children
        .iter()
        .map(|node| match node {
            DiagnosticTreeNode::Module(module) => module,
            other => panic!("expected module node, got {:?}", other),
        })
        .collect();
    assert_eq!(modules.len(), 2);
    assert_eq!(modules[0].label, Path::new("pkg").join("a.py").to_string_lossy());
    assert_eq!(modules[0].children.len(), 2);
    assert_eq!(modules[0].children[1].text, "[C0301] 3 : line too long");
    assert_eq!(modules[1].path, pkg.join("b.py"));
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancel_current_run() {
    let dir = TempDir::new().unwrap();
    let launcher = ScriptedLauncher::new(vec![ProcessEvent::Stdout(b"partial".to_vec())]);
    let mut service = service(&dir, launcher.clone());

    service.analyze("/proj/foo.py").await.unwrap();
    assert!(service.is_running());

    service.cancel_current_run().await.unwrap();

    assert!(launcher.was_killed());
    assert!(!service.is_running());
    assert_eq!(service.run_state(), RunState::Idle);
    assert!(service.wait_for_completion().await.unwrap().is_none());
    assert!(service.history().is_empty());
}

#[tokio::test]
async fn test_cancel_from_select() {
    let dir = TempDir::new().unwrap();
    let launcher = ScriptedLauncher::new(vec![]);
    let mut service = service(&dir, launcher.clone());
    service.analyze("/proj/foo.py").await.unwrap();

    let finished = tokio::select! {
        _ = service.wait_for_completion() => true,
        _ = tokio::time::sleep(std::time::Duration::from_millis(20)) => false,
    };
    assert!(!finished);

    service.cancel_current_run().await.unwrap();
    assert!(launcher.was_killed());
}

// ============================================================================
// Cached results
// ============================================================================

#[tokio::test]
async fn test_display_tree_from_cache() {
    let dir = TempDir::new().unwrap();
    let mut service = service(&dir, ScriptedLauncher::stdout("foo:10:C1: message: bad style\n", 0));

    assert!(matches!(
        service.get_display_tree("/proj/foo.py"),
        Err(AppError::NoResult(_))
    ));

    service.analyze("/proj/foo.py").await.unwrap();
    let report = service.wait_for_completion().await.unwrap().unwrap();

    let tree = service.get_display_tree("/proj/foo.py").unwrap();
    assert_eq!(tree, report.tree);
}

#[tokio::test]
async fn test_results_survive_restart() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("foo.py");
    fs::write(&target, "").unwrap();
    {
        let mut service = service(&dir, ScriptedLauncher::stdout("foo:10:C1: message: bad style\n", 0));
        service.analyze(&target).await.unwrap();
        service.wait_for_completion().await.unwrap();
    }

    let mut restarted = service(&dir, ScriptedLauncher::new(vec![]));
    assert_eq!(restarted.history(), vec![target.clone()]);
    assert_eq!(
        restarted.get_cached_diagnostics(&target).unwrap().map(|d| d.len()),
        Some(1)
    );
}

#[tokio::test]
async fn test_restart_drops_deleted_targets() {
    let dir = TempDir::new().unwrap();
    let kept = dir.path().join("kept.py");
    let deleted = dir.path().join("deleted.py");
    fs::write(&kept, "").unwrap();
    fs::write(&deleted, "").unwrap();
    {
        let mut service = service(&dir, ScriptedLauncher::stdout("x:1:C1: message: m\n", 0));
        for target in [&kept, &deleted] {
            service.analyze(target).await.unwrap();
            service.wait_for_completion().await.unwrap();
        }
        assert_eq!(service.history().len(), 2);
    }
    fs::remove_file(&deleted).unwrap();

    let mut restarted = service(&dir, ScriptedLauncher::new(vec![]));
    assert_eq!(restarted.history(), vec![kept.clone()]);
    assert_eq!(restarted.get_cached_diagnostics(&deleted).unwrap(), None);

    // The pruned store was written back
    let content = fs::read_to_string(dir.path().join("results.json")).unwrap();
    assert!(!content.contains("deleted.py"));
}

#[tokio::test]
async fn test_prune_obsolete_targets() {
    let dir = TempDir::new().unwrap();
    let kept = dir.path().join("kept.py");
    let removed = dir.path().join("removed.py");
    fs::write(&kept, "").unwrap();
    fs::write(&removed, "").unwrap();

    let mut service = service(&dir, ScriptedLauncher::stdout("x:1:C1: message: m\n", 0));
    for target in [&kept, &removed] {
        service.analyze(target).await.unwrap();
        service.wait_for_completion().await.unwrap();
    }
    fs::remove_file(&removed).unwrap();

    assert_eq!(service.prune_obsolete().unwrap(), 1);
    assert_eq!(service.history(), vec![kept]);
}

#[tokio::test]
async fn test_activate_message_node() {
    let dir = TempDir::new().unwrap();
    let sink = Arc::new(RecordingSink::new());
    let mut service = service(&dir, ScriptedLauncher::stdout("foo:10:C1: message: bad style\n", 0))
        .with_navigation(sink.clone());

    service.analyze("/proj/foo.py").await.unwrap();
    let report = service.wait_for_completion().await.unwrap().unwrap();
    let messages = report.tree.messages();

    let target = service.activate(messages[0]);

    assert_eq!(target, NavigationRef::new("/proj/foo.py", 10));
    assert_eq!(sink.requests(), vec![target]);
}

// ============================================================================
// Real process
// ============================================================================

#[cfg(unix)]
#[tokio::test]
async fn test_shell_analyzer_end_to_end() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("foo.py");
    fs::write(&target, "x = 1\n").unwrap();

    let settings = AnalyzerSettings {
        interpreter: "sh".to_string(),
        args: vec![
            "-c".to_string(),
            "echo 'foo:1:C0114: message: missing docstring'; echo 'rated 5/10' 1>&2".to_string(),
        ],
        pass_target: false,
        results_file: Some(dir.path().join("results.json")),
        ..Default::default()
    };
    let mut service = AnalysisService::new(settings).unwrap();

    service.analyze(&target).await.unwrap();
    let report = service.wait_for_completion().await.unwrap().unwrap();

    assert_eq!(report.exit_code, Some(0));
    assert_eq!(
        report.diagnostics,
        vec![DiagnosticRecord::new(
            target.to_string_lossy(),
            1,
            "missing docstring",
            "C0114"
        )]
    );
    assert_eq!(
        service.get_combined_log().as_deref(),
        Some("rated 5/10\nfoo:1:C0114: message: missing docstring\n")
    );
}

#[tokio::test]
async fn test_missing_interpreter() {
    let dir = TempDir::new().unwrap();
    let settings = AnalyzerSettings {
        interpreter: "lintview-missing-interpreter".to_string(),
        results_file: Some(dir.path().join("results.json")),
        ..Default::default()
    };
    let mut service = AnalysisService::new(settings).unwrap();

    let err = service.analyze(dir.path().join("foo.py")).await.unwrap_err();

    assert!(matches!(err, AppError::StartFailure(_)));
    assert_eq!(service.run_state(), RunState::Idle);
}
