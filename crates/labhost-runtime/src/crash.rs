//! Crash recovery.
//!
//! The supervisor never decides what to do about a failure; it queues a
//! [`CrashReport`]. `CrashHandler` drains that queue one report at a time,
//! asks the user whether to reload or close, and acts on the answer.
//!
//! Reload forces a fresh executable prompt (the old one may be the reason for
//! the failure), saves the answer, and restarts. Close shuts the supervisor
//! down for good and closes the owning session.

use std::sync::Arc;

use labhost_core::{
    ChoicePrompt, CrashChoice, CrashReport, ServerEvent, ServerEventEmitter, WorkspaceSession,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::locator::ExecutableLocator;
use crate::process::{CrashReceiver, ServerSupervisor};

/// Where the session stands with respect to failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashState {
    /// No unresolved failure.
    Running,
    /// A failure is waiting on (or being acted on after) a user decision.
    Crashed,
    /// The user chose Close. Terminal.
    Closed,
}

/// What handling a single report ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// Reload succeeded; carries the new process id.
    Restarted(u32),
    /// Reload was chosen but the new launch failed. A fresh report is queued.
    RestartFailed,
    /// The report (or the decision) was superseded by a later start or stop.
    Ignored,
    /// The session was closed.
    Closed,
}

pub struct CrashHandler {
    supervisor: Arc<ServerSupervisor>,
    locator: Arc<ExecutableLocator>,
    prompt: Arc<dyn ChoicePrompt>,
    session: Arc<dyn WorkspaceSession>,
    emitter: Arc<dyn ServerEventEmitter>,
    display_name: String,
    state: watch::Sender<CrashState>,
}

impl CrashHandler {
    pub fn new(
        supervisor: Arc<ServerSupervisor>,
        locator: Arc<ExecutableLocator>,
        prompt: Arc<dyn ChoicePrompt>,
        session: Arc<dyn WorkspaceSession>,
        emitter: Arc<dyn ServerEventEmitter>,
    ) -> Self {
        let (state, _) = watch::channel(CrashState::Running);
        Self {
            supervisor,
            locator,
            prompt,
            session,
            emitter,
            display_name: labhost_core::config::DEFAULT_DISPLAY_NAME.to_string(),
            state,
        }
    }

    /// Name used in the dialog title and message.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Watch the crash state.
    pub fn subscribe(&self) -> watch::Receiver<CrashState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> CrashState {
        *self.state.borrow()
    }

    /// Process reports until the channel closes or the session is closed.
    pub async fn run(&self, mut reports: CrashReceiver) {
        while let Some(report) = reports.recv().await {
            if self.handle(report).await == RecoveryOutcome::Closed {
                break;
            }
        }
        debug!("Crash handler stopped");
    }

    /// Run the handler on its own task.
    pub fn spawn(self: Arc<Self>, reports: CrashReceiver) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(reports).await })
    }

    /// Prompt for and carry out the recovery of one failure.
    pub async fn handle(&self, report: CrashReport) -> RecoveryOutcome {
        if self.state() == CrashState::Closed {
            return RecoveryOutcome::Closed;
        }
        if !self.supervisor.is_current(report.generation) {
            debug!(generation = report.generation, "Ignoring superseded crash report");
            return RecoveryOutcome::Ignored;
        }

        self.state.send_replace(CrashState::Crashed);

        let title = format!("{} crashed", self.display_name);
        let message = format!(
            "{} crashed with the error:\n{}",
            self.display_name, report.message
        );
        let index = self
            .prompt
            .prompt_choice(&title, &message, &CrashChoice::BUTTONS)
            .await;
        let choice = CrashChoice::from_index(index);
        info!(?choice, kind = %report.kind, "Crash decision received");

        match choice {
            CrashChoice::Reload => self.reload(report.generation).await,
            CrashChoice::Close => self.close().await,
        }
    }

    async fn reload(&self, generation: u64) -> RecoveryOutcome {
        // Stopped while the dialog was open.
        if !self.supervisor.is_current(generation) {
            self.state.send_replace(CrashState::Running);
            return RecoveryOutcome::Ignored;
        }

        self.emitter.emit(ServerEvent::Recovering);
        let executable = self.locator.resolve(true, true).await;

        match self
            .supervisor
            .restart_if_current(generation, executable)
            .await
        {
            Ok(Some(pid)) => {
                self.state.send_replace(CrashState::Running);
                RecoveryOutcome::Restarted(pid)
            }
            Ok(None) => {
                debug!(generation, "Reload superseded by a later start or stop");
                self.state.send_replace(CrashState::Running);
                RecoveryOutcome::Ignored
            }
            Err(e) => {
                warn!(error = %e, "Reload failed");
                RecoveryOutcome::RestartFailed
            }
        }
    }

    async fn close(&self) -> RecoveryOutcome {
        self.state.send_replace(CrashState::Closed);
        self.emitter.emit(ServerEvent::SessionClosed);

        if let Err(e) = self.supervisor.shutdown().await {
            warn!(error = %e, "Failed to stop server while closing session");
        }

        info!("Closing session after crash");
        self.session.close();
        RecoveryOutcome::Closed
    }
}
