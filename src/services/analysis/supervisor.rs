//! Analysis Run Supervisor
//!
//! Owns at most one analyzer run at a time. Output chunks are accumulated
//! per stream while the run is live; the exit event turns them into a
//! [`RunCompletion`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use lintview_diagnostics::{DiagnosticRecord, OutputParser, Target};

use crate::models::settings::AnalyzerSettings;
use crate::services::analysis::process::{
    AnalyzerProcess, LaunchedProcess, ProcessEvent, ProcessLauncher, SpawnConfig,
};
use crate::utils::error::AppResult;

/// Identifies a started run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    /// Monotonic per supervisor, starting at 1
    pub run_id: u64,
    pub target: Target,
    pub pid: Option<u32>,
}

/// Lifecycle of the supervised run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Finished {
        exit_code: Option<i32>,
        had_output: bool,
    },
}

/// What a finished run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunCompletion {
    /// Standard output was captured and parsed
    Parsed {
        target: Target,
        diagnostics: Vec<DiagnosticRecord>,
        exit_code: Option<i32>,
    },
    /// Only standard error was captured
    ErrorOnly {
        target: Target,
        stderr: String,
        exit_code: Option<i32>,
    },
    /// Nothing was captured
    NoOutput {
        target: Target,
        exit_code: Option<i32>,
    },
}

impl RunCompletion {
    pub fn target(&self) -> &Target {
        match self {
            RunCompletion::Parsed { target, .. }
            | RunCompletion::ErrorOnly { target, .. }
            | RunCompletion::NoOutput { target, .. } => target,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            RunCompletion::Parsed { exit_code, .. }
            | RunCompletion::ErrorOnly { exit_code, .. }
            | RunCompletion::NoOutput { exit_code, .. } => *exit_code,
        }
    }
}

/// The live run: process handle, event stream and the parser bound to its target
struct ActiveRun {
    process: Box<dyn AnalyzerProcess>,
    events: tokio::sync::mpsc::UnboundedReceiver<ProcessEvent>,
    parser: OutputParser,
}

/// Supervises analyzer runs
pub struct AnalysisRunSupervisor {
    launcher: Arc<dyn ProcessLauncher>,
    settings: AnalyzerSettings,
    state: RunState,
    active: Option<ActiveRun>,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    last_run_id: u64,
}

impl AnalysisRunSupervisor {
    pub fn new(launcher: Arc<dyn ProcessLauncher>, settings: AnalyzerSettings) -> Self {
        Self {
            launcher,
            settings,
            state: RunState::Idle,
            active: None,
            stdout: Vec::new(),
            stderr: Vec::new(),
            last_run_id: 0,
        }
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Start analyzing `target`, terminating any previous run first.
    ///
    /// On launch failure the state stays `Idle` and the buffers of the
    /// previous run are left as they were.
    pub async fn start(&mut self, target: Target) -> AppResult<RunHandle> {
        self.cancel().await?;

        let parser = OutputParser::new(target.clone(), &self.settings.marker)?;
        let config = SpawnConfig::for_target(&self.settings, &target);
        let LaunchedProcess { process, events } = self.launcher.launch(&config).await?;

        self.stdout.clear();
        self.stderr.clear();
        self.last_run_id += 1;

        let handle = RunHandle {
            run_id: self.last_run_id,
            target,
            pid: process.pid(),
        };
        self.active = Some(ActiveRun {
            process,
            events,
            parser,
        });
        self.state = RunState::Running;

        info!(
            "Started run {} for {} (pid {:?})",
            handle.run_id, handle.target, handle.pid
        );
        Ok(handle)
    }

    /// Terminate the live run, if any, and wait until it is gone
    pub async fn cancel(&mut self) -> AppResult<()> {
        if let Some(run) = self.active.take() {
            let ActiveRun {
                mut process,
                events,
                parser,
            } = run;
            // Close the stream first so no late events are observed
            drop(events);
            process.kill().await?;
            info!("Cancelled run {} for {}", self.last_run_id, parser.target());
        }
        self.state = RunState::Idle;
        Ok(())
    }

    /// Apply one process event to the run state
    pub fn handle_event(&mut self, event: ProcessEvent) -> Option<RunCompletion> {
        if self.state != RunState::Running {
            debug!("Ignoring event outside a live run");
            return None;
        }

        match event {
            ProcessEvent::Stdout(bytes) => {
                debug!("Received {} bytes of stdout", bytes.len());
                self.stdout.extend_from_slice(&bytes);
                None
            }
            ProcessEvent::Stderr(bytes) => {
                debug!("Received {} bytes of stderr", bytes.len());
                self.stderr.extend_from_slice(&bytes);
                None
            }
            ProcessEvent::Exited(exit_code) => {
                let run = self.active.take()?;
                Some(self.finish(run.parser, exit_code))
            }
        }
    }

    fn finish(&mut self, parser: OutputParser, exit_code: Option<i32>) -> RunCompletion {
        let had_output = !self.stdout.is_empty();
        self.state = RunState::Finished {
            exit_code,
            had_output,
        };
        let target = parser.target().clone();

        if !had_output {
            if self.stderr.is_empty() {
                info!("Run for {} finished without output", target);
                return RunCompletion::NoOutput { target, exit_code };
            }
            let stderr = String::from_utf8_lossy(&self.stderr).into_owned();
            warn!("Run for {} produced only error output", target);
            return RunCompletion::ErrorOnly {
                target,
                stderr,
                exit_code,
            };
        }

        let diagnostics = parser.parse(&String::from_utf8_lossy(&self.stdout));
        info!(
            "Run for {} finished with exit code {:?}: {} diagnostics",
            target,
            exit_code,
            diagnostics.len()
        );
        RunCompletion::Parsed {
            target,
            diagnostics,
            exit_code,
        }
    }

    /// Wait for the live run to finish.
    ///
    /// Cancel safe: the only await point is the channel receive, so this can
    /// sit in a `select!` next to a branch that calls [`Self::cancel`].
    pub async fn next_completion(&mut self) -> Option<RunCompletion> {
        loop {
            let event = self.active.as_mut()?.events.recv().await;
            // A closed stream without an exit event means the pump went away
            let event = event.unwrap_or(ProcessEvent::Exited(None));
            if let Some(completion) = self.handle_event(event) {
                return Some(completion);
            }
        }
    }

    /// Error output followed by standard output of the last run
    pub fn combined_log(&self) -> Option<String> {
        if self.stdout.is_empty() && self.stderr.is_empty() {
            return None;
        }
        let mut log = String::from_utf8_lossy(&self.stderr).into_owned();
        if !log.is_empty() && !log.ends_with('\n') && !self.stdout.is_empty() {
            log.push('\n');
        }
        log.push_str(&String::from_utf8_lossy(&self.stdout));
        Some(log)
    }
}
