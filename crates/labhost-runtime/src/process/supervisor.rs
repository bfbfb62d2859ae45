//! Single-process lifecycle management for the notebook server.
//!
//! `ServerSupervisor` owns at most one child process. `start` always stops the
//! previous process first, and the whole of `start`/`stop` runs under one
//! async mutex so concurrent callers serialize.
//!
//! Failures are never handled here. Launch errors and unexpected exits are
//! turned into [`CrashReport`]s and pushed onto a channel consumed by the
//! crash handler. Every start and stop bumps a generation counter; reports
//! and recovery requests carrying an old generation are ignored, which keeps
//! a late "Reload" answer from resurrecting a process that was stopped.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use labhost_core::{
    CrashReport, Endpoint, ExecutableRef, FailureKind, LabhostConfig, NavigationSink, ServerEvent,
    ServerEventEmitter, SupervisorError, WindowHandle,
};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::shutdown::shutdown_child;
use super::stream::spawn_stream_reader;
use crate::locator::{ExecutableLocator, binary_in_env};
use crate::scanner::OutputScanner;

/// How long an exited process's stderr reader gets to drain before the
/// transcript is captured.
const READER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Receiving end for crash reports, consumed by the crash handler.
pub type CrashReceiver = mpsc::UnboundedReceiver<CrashReport>;

struct RunningServer {
    pid: u32,
    generation: u64,
    stop_tx: oneshot::Sender<()>,
    monitor: JoinHandle<io::Result<()>>,
}

#[derive(Default)]
struct SupervisorState {
    executable: Option<ExecutableRef>,
    running: Option<RunningServer>,
    scanner: Arc<StdMutex<OutputScanner>>,
    closed: bool,
}

/// Supervises the notebook server process.
pub struct ServerSupervisor {
    config: LabhostConfig,
    locator: Arc<ExecutableLocator>,
    navigation: Arc<dyn NavigationSink>,
    window: WindowHandle,
    emitter: Arc<dyn ServerEventEmitter>,
    crash_tx: mpsc::UnboundedSender<CrashReport>,
    generation: Arc<AtomicU64>,
    state: Mutex<SupervisorState>,
}

impl ServerSupervisor {
    /// Create a supervisor and the receiver its crash reports are sent to.
    pub fn new(
        config: LabhostConfig,
        locator: Arc<ExecutableLocator>,
        navigation: Arc<dyn NavigationSink>,
        window: WindowHandle,
        emitter: Arc<dyn ServerEventEmitter>,
    ) -> (Self, CrashReceiver) {
        let (crash_tx, crash_rx) = mpsc::unbounded_channel();
        let supervisor = Self {
            config,
            locator,
            navigation,
            window,
            emitter,
            crash_tx,
            generation: Arc::new(AtomicU64::new(0)),
            state: Mutex::new(SupervisorState::default()),
        };
        (supervisor, crash_rx)
    }

    /// Start the server, stopping any running instance first.
    ///
    /// Resolves the executable (without forcing a prompt) if none has been
    /// resolved yet. Returns the new process id.
    pub async fn start(&self) -> Result<u32, SupervisorError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(SupervisorError::Closed);
        }

        let generation = self.next_generation();
        self.stop_quietly(&mut state).await;

        // A cancelled prompt leaves an empty path; discover again.
        let executable = match state.executable.clone().filter(|e| !e.is_empty()) {
            Some(executable) => executable,
            None => {
                let resolved = self.locator.resolve(false, true).await;
                state.executable = Some(resolved.clone());
                resolved
            }
        };

        self.launch(&mut state, executable, generation)
    }

    /// Start the server with a specific executable, which becomes the
    /// resolved executable for later starts.
    pub async fn start_with(&self, executable: ExecutableRef) -> Result<u32, SupervisorError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(SupervisorError::Closed);
        }

        let generation = self.next_generation();
        self.stop_quietly(&mut state).await;
        state.executable = Some(executable.clone());

        self.launch(&mut state, executable, generation)
    }

    /// Restart with `executable`, but only if nothing has started or stopped
    /// the server since the failure tagged with `generation`.
    ///
    /// Returns `Ok(None)` when the request is stale.
    pub async fn restart_if_current(
        &self,
        generation: u64,
        executable: ExecutableRef,
    ) -> Result<Option<u32>, SupervisorError> {
        let mut state = self.state.lock().await;
        if state.closed || !self.is_current(generation) {
            debug!(generation, "Skipping stale restart request");
            return Ok(None);
        }

        let generation = self.next_generation();
        self.stop_quietly(&mut state).await;
        state.executable = Some(executable.clone());

        self.launch(&mut state, executable, generation).map(Some)
    }

    /// Stop the running server, if any. Safe to call repeatedly.
    pub async fn stop(&self) -> Result<(), SupervisorError> {
        let mut state = self.state.lock().await;
        self.next_generation();
        self.stop_locked(&mut state).await
    }

    /// Stop the server and refuse any further starts.
    pub async fn shutdown(&self) -> Result<(), SupervisorError> {
        let mut state = self.state.lock().await;
        state.closed = true;
        self.next_generation();
        self.stop_locked(&mut state).await
    }

    /// Whether `generation` is still the latest start/stop.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Current generation counter.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Whether a server process is alive.
    pub async fn is_running(&self) -> bool {
        let state = self.state.lock().await;
        state
            .running
            .as_ref()
            .is_some_and(|running| !running.monitor.is_finished())
    }

    /// Process id of the live server, if any.
    pub async fn pid(&self) -> Option<u32> {
        let state = self.state.lock().await;
        state
            .running
            .as_ref()
            .filter(|running| !running.monitor.is_finished())
            .map(|running| running.pid)
    }

    /// The executable used for the current or next launch.
    pub async fn executable(&self) -> Option<ExecutableRef> {
        self.state.lock().await.executable.clone()
    }

    /// Endpoint discovered for the current process.
    pub async fn endpoint(&self) -> Option<Endpoint> {
        let state = self.state.lock().await;
        let scanner = state.scanner.lock().ok()?;
        scanner.endpoint().cloned()
    }

    /// Diagnostic transcript of the current process.
    pub async fn transcript(&self) -> String {
        let state = self.state.lock().await;
        state
            .scanner
            .lock()
            .map(|scanner| scanner.transcript().to_string())
            .unwrap_or_default()
    }

    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn stop_quietly(&self, state: &mut SupervisorState) {
        if let Err(e) = self.stop_locked(state).await {
            warn!(error = %e, "Previous server process did not stop cleanly");
        }
    }

    async fn stop_locked(&self, state: &mut SupervisorState) -> Result<(), SupervisorError> {
        let Some(running) = state.running.take() else {
            return Ok(());
        };

        let was_live = !running.monitor.is_finished();
        debug!(pid = running.pid, generation = running.generation, "Stopping server process");

        // The monitor may already have exited; that's fine.
        let _ = running.stop_tx.send(());

        let result = match running.monitor.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(SupervisorError::Stop(e.to_string())),
            Err(e) => Err(SupervisorError::Stop(e.to_string())),
        };

        if was_live {
            info!(pid = running.pid, "Server process stopped");
            self.emitter.emit(ServerEvent::Stopped);
        }

        result
    }

    fn launch(
        &self,
        state: &mut SupervisorState,
        executable: ExecutableRef,
        generation: u64,
    ) -> Result<u32, SupervisorError> {
        state.scanner = Arc::new(StdMutex::new(self.new_scanner()));

        self.emitter.emit(ServerEvent::Starting {
            executable: executable.to_string(),
        });

        if executable.is_empty() {
            return Err(self.launch_failed(&executable, "no executable selected".into(), generation));
        }

        let command_line = self.command_line(&executable);
        info!(command = %command_line, cwd = %self.config.home_dir.display(), "Launching notebook server");

        let mut child = match self.build_command(&executable).spawn() {
            Ok(child) => child,
            Err(e) => return Err(self.launch_failed(&executable, e.to_string(), generation)),
        };

        let Some(pid) = child.id() else {
            return Err(self.launch_failed(
                &executable,
                "process exited before it could be tracked".into(),
                generation,
            ));
        };

        let reader = child
            .stderr
            .take()
            .map(|stderr| spawn_stream_reader(stderr, state.scanner.clone(), pid));

        let (stop_tx, stop_rx) = oneshot::channel();
        let watch = ExitWatch {
            pid,
            generation,
            current: self.generation.clone(),
            command_line,
            scanner: state.scanner.clone(),
            reader,
            emitter: self.emitter.clone(),
            crash_tx: self.crash_tx.clone(),
            grace: self.config.shutdown_grace,
        };
        let monitor = tokio::spawn(watch_exit(child, stop_rx, watch));

        state.running = Some(RunningServer {
            pid,
            generation,
            stop_tx,
            monitor,
        });

        info!(pid, generation, "Notebook server started");
        self.emitter.emit(ServerEvent::Running { pid });
        Ok(pid)
    }

    fn new_scanner(&self) -> OutputScanner {
        let navigation = self.navigation.clone();
        let emitter = self.emitter.clone();
        let window = self.window.clone();

        OutputScanner::new().on_endpoint(move |endpoint| {
            info!(url = %endpoint, "Notebook server endpoint discovered");
            emitter.emit(ServerEvent::EndpointDiscovered {
                url: endpoint.to_string(),
            });
            navigation.load_url(&window, endpoint);
        })
    }

    /// Program to run for `executable`. An environment root (as produced by
    /// the registry tier) expands to `<root>/bin/<binary>`.
    fn program_path(&self, executable: &ExecutableRef) -> PathBuf {
        let path = executable.as_path();
        if path.is_dir() {
            binary_in_env(path, &self.config.binary_name)
        } else {
            path.to_path_buf()
        }
    }

    fn build_command(&self, executable: &ExecutableRef) -> Command {
        let mut cmd = Command::new(self.program_path(executable));
        cmd.args(&self.config.launch_args)
            .current_dir(&self.config.home_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn command_line(&self, executable: &ExecutableRef) -> String {
        let program = self.program_path(executable);
        std::iter::once(program.to_string_lossy().into_owned())
            .chain(self.config.launch_args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn launch_failed(
        &self,
        executable: &ExecutableRef,
        message: String,
        generation: u64,
    ) -> SupervisorError {
        warn!(executable = %executable, error = %message, "Failed to launch notebook server");

        self.emitter.emit(ServerEvent::Crashed {
            kind: FailureKind::Launch,
            message: message.clone(),
        });
        if self
            .crash_tx
            .send(CrashReport::launch(message.clone(), generation))
            .is_err()
        {
            debug!("No crash handler listening");
        }

        SupervisorError::Launch {
            executable: executable.to_string(),
            message,
        }
    }
}

/// Everything the exit monitor needs, detached from the supervisor.
struct ExitWatch {
    pid: u32,
    generation: u64,
    current: Arc<AtomicU64>,
    command_line: String,
    scanner: Arc<StdMutex<OutputScanner>>,
    reader: Option<JoinHandle<()>>,
    emitter: Arc<dyn ServerEventEmitter>,
    crash_tx: mpsc::UnboundedSender<CrashReport>,
    grace: Duration,
}

/// Owns the child until it exits or a stop is requested.
///
/// A dropped stop sender counts as a stop request.
async fn watch_exit(
    mut child: Child,
    mut stop_rx: oneshot::Receiver<()>,
    watch: ExitWatch,
) -> io::Result<()> {
    tokio::select! {
        _ = &mut stop_rx => {
            let status = shutdown_child(&mut child, watch.grace).await?;
            debug!(pid = watch.pid, %status, "Server process reaped");
            Ok(())
        }
        result = child.wait() => {
            watch.on_exit(result).await;
            Ok(())
        }
    }
}

impl ExitWatch {
    async fn on_exit(mut self, result: io::Result<std::process::ExitStatus>) {
        let (message, exit_code) = match result {
            Ok(status) if status.success() => {
                info!(pid = self.pid, "Notebook server exited cleanly");
                if self.is_current() {
                    self.emitter.emit(ServerEvent::Stopped);
                }
                return;
            }
            Ok(status) => (
                format!("Command failed: {}\n{status}", self.command_line),
                status.code(),
            ),
            Err(e) => (e.to_string(), None),
        };

        if let Some(reader) = self.reader.take() {
            let _ = timeout(READER_DRAIN_TIMEOUT, reader).await;
        }

        if !self.is_current() {
            debug!(pid = self.pid, generation = self.generation, "Ignoring exit of superseded process");
            return;
        }

        let transcript = self
            .scanner
            .lock()
            .map(|scanner| scanner.transcript().to_string())
            .unwrap_or_default();

        warn!(pid = self.pid, exit_code = ?exit_code, error = %message, "Notebook server crashed");

        self.emitter.emit(ServerEvent::Crashed {
            kind: FailureKind::Runtime,
            message: message.clone(),
        });
        let report = CrashReport::runtime(message, transcript, exit_code, self.generation);
        if self.crash_tx.send(report).is_err() {
            debug!("No crash handler listening");
        }
    }

    fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }
}
