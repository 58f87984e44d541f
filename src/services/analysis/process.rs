//! Analyzer Process Management
//!
//! Spawns the external analyzer and turns its pipes into a stream of
//! [`ProcessEvent`]s. A pump task owns the child: it reads stdout and
//! stderr as data arrives, and reports the exit as soon as the child is
//! reaped, even when a grandchild still holds the pipes open.
//! `Exited` is always the last event of a run.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use lintview_diagnostics::Target;

use crate::models::settings::AnalyzerSettings;
use crate::utils::error::{AppError, AppResult};

const READ_BUFFER_SIZE: usize = 4096;

/// How long to wait for buffered output after the child has exited
const DRAIN_TIMEOUT: Duration = Duration::from_millis(100);

/// Upper bound on chunks read per pipe after exit
const MAX_DRAIN_CHUNKS: usize = 256;

/// Notification delivered from a running analyzer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// A chunk of standard output
    Stdout(Vec<u8>),
    /// A chunk of standard error
    Stderr(Vec<u8>),
    /// The process is gone; `None` when it was terminated by a signal
    Exited(Option<i32>),
}

/// Configuration for spawning an analyzer process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnConfig {
    /// Executable to run
    pub program: String,
    /// Command line arguments
    pub args: Vec<String>,
    /// Working directory for the process
    pub working_dir: PathBuf,
}

impl SpawnConfig {
    /// Create a new spawn configuration with no arguments
    pub fn new(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
        }
    }

    /// Replace the argument list
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Build the invocation for analyzing `target`:
    /// `<interpreter> <args...> [<target path>]` run from the target's directory.
    pub fn for_target(settings: &AnalyzerSettings, target: &Target) -> Self {
        let config = Self::new(&settings.interpreter, target.directory())
            .with_args(settings.args.iter().cloned());
        if settings.pass_target {
            config.arg(target.path().to_string_lossy())
        } else {
            config
        }
    }
}

/// Handle to a launched analyzer
#[async_trait]
pub trait AnalyzerProcess: Send {
    /// OS process id, when known
    fn pid(&self) -> Option<u32>;

    /// Terminate the process and wait until termination is observed
    async fn kill(&mut self) -> AppResult<()>;
}

/// A launched process together with its event stream
pub struct LaunchedProcess {
    pub process: Box<dyn AnalyzerProcess>,
    pub events: mpsc::UnboundedReceiver<ProcessEvent>,
}

impl std::fmt::Debug for LaunchedProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchedProcess")
            .field("pid", &self.process.pid())
            .finish_non_exhaustive()
    }
}

/// Starts analyzer processes
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    async fn launch(&self, config: &SpawnConfig) -> AppResult<LaunchedProcess>;
}

/// Handle to a real child process driven by a pump task
pub struct ChildProcess {
    pid: Option<u32>,
    kill_tx: Option<oneshot::Sender<()>>,
    pump: Option<JoinHandle<()>>,
}

#[async_trait]
impl AnalyzerProcess for ChildProcess {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    async fn kill(&mut self) -> AppResult<()> {
        if let Some(kill_tx) = self.kill_tx.take() {
            // The pump may already be done; a closed channel is fine.
            let _ = kill_tx.send(());
        }
        if let Some(pump) = self.pump.take() {
            pump.await
                .map_err(|e| AppError::internal(format!("Process pump failed: {}", e)))?;
        }
        Ok(())
    }
}

impl Drop for ChildProcess {
    fn drop(&mut self) {
        // Dropping the sender tells the pump to kill the child
        self.kill_tx.take();
    }
}

/// Launches the analyzer as an OS child process
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyzerExecutor;

impl AnalyzerExecutor {
    /// Create a new executor instance
    pub fn new() -> Self {
        Self
    }

    fn spawn(&self, config: &SpawnConfig) -> AppResult<Child> {
        let mut cmd = Command::new(&config.program);
        cmd.args(&config.args);
        cmd.current_dir(&config.working_dir);

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::start_failure(format!(
                    "{} not found (working directory {})",
                    config.program,
                    config.working_dir.display()
                ))
            } else {
                AppError::start_failure(format!("Failed to spawn {}: {}", config.program, e))
            }
        })
    }
}

#[async_trait]
impl ProcessLauncher for AnalyzerExecutor {
    async fn launch(&self, config: &SpawnConfig) -> AppResult<LaunchedProcess> {
        let mut child = self.spawn(config)?;
        let pid = child.id();

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        if stdout.is_none() || stderr.is_none() {
            let _ = child.start_kill();
            return Err(AppError::start_failure("Failed to capture analyzer output"));
        }

        // Unbounded so the pump never waits on the consumer while the pipes fill
        let (event_tx, events) = mpsc::unbounded_channel();
        let (kill_tx, kill_rx) = oneshot::channel();

        let pump = tokio::spawn(pump(child, stdout, stderr, kill_rx, event_tx));

        debug!("Launched {} (pid {:?}) in {}", config.program, pid, config.working_dir.display());

        Ok(LaunchedProcess {
            process: Box::new(ChildProcess {
                pid,
                kill_tx: Some(kill_tx),
                pump: Some(pump),
            }),
            events,
        })
    }
}

/// Read one chunk; `None` on end of stream or a read error
async fn read_chunk<R: AsyncRead + Unpin>(reader: &mut Option<R>, buf: &mut [u8]) -> Option<Vec<u8>> {
    let stream = reader.as_mut()?;
    match stream.read(buf).await {
        Ok(0) => None,
        Ok(n) => Some(buf[..n].to_vec()),
        Err(e) => {
            warn!("Failed to read analyzer output: {}", e);
            None
        }
    }
}

async fn terminate(child: &mut Child) -> Option<i32> {
    if let Err(e) = child.kill().await {
        warn!("Failed to kill analyzer process: {}", e);
    }
    child.wait().await.ok().and_then(|status| status.code())
}

fn exit_code(status: std::io::Result<ExitStatus>) -> Option<i32> {
    match status {
        Ok(status) => status.code(),
        Err(e) => {
            warn!("Failed to wait for analyzer process: {}", e);
            None
        }
    }
}

/// Forward whatever is still buffered in `reader`, stopping at end of
/// stream or once nothing arrives within [`DRAIN_TIMEOUT`]
async fn drain<R: AsyncRead + Unpin>(
    reader: &mut Option<R>,
    buf: &mut [u8],
    events: &mpsc::UnboundedSender<ProcessEvent>,
    wrap: fn(Vec<u8>) -> ProcessEvent,
) {
    for _ in 0..MAX_DRAIN_CHUNKS {
        match tokio::time::timeout(DRAIN_TIMEOUT, read_chunk(reader, buf)).await {
            Ok(Some(bytes)) => {
                let _ = events.send(wrap(bytes));
            }
            Ok(None) => return,
            Err(_) => {
                debug!("Analyzer output still open after exit, closing it");
                return;
            }
        }
    }
}

async fn pump(
    mut child: Child,
    mut stdout: Option<ChildStdout>,
    mut stderr: Option<ChildStderr>,
    mut kill_rx: oneshot::Receiver<()>,
    events: mpsc::UnboundedSender<ProcessEvent>,
) {
    let mut out_buf = [0u8; READ_BUFFER_SIZE];
    let mut err_buf = [0u8; READ_BUFFER_SIZE];

    // Sends fail only once the receiver is gone; keep draining so the child
    // never blocks on a full pipe.
    let code = loop {
        tokio::select! {
            _ = &mut kill_rx => {
                let code = terminate(&mut child).await;
                let _ = events.send(ProcessEvent::Exited(code));
                return;
            }
            status = child.wait() => break exit_code(status),
            chunk = read_chunk(&mut stdout, &mut out_buf), if stdout.is_some() => match chunk {
                Some(bytes) => {
                    let _ = events.send(ProcessEvent::Stdout(bytes));
                }
                None => stdout = None,
            },
            chunk = read_chunk(&mut stderr, &mut err_buf), if stderr.is_some() => match chunk {
                Some(bytes) => {
                    let _ = events.send(ProcessEvent::Stderr(bytes));
                }
                None => stderr = None,
            },
        }
    };

    drain(&mut stdout, &mut out_buf, &events, ProcessEvent::Stdout).await;
    drain(&mut stderr, &mut err_buf, &events, ProcessEvent::Stderr).await;
    let _ = events.send(ProcessEvent::Exited(code));
}
