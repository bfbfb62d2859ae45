//! Shared fakes and harness for labhost-runtime integration tests.
//!
//! Fake servers are plain `sh -c` scripts passed as launch arguments, so no
//! executable files are written during the tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use labhost_core::{
    ChoicePrompt, Endpoint, FilePrompt, FilePromptOptions, InMemoryPreferenceStore, LabhostConfig,
    NavigationSink, ServerEvent, ServerEventEmitter, WindowHandle, WorkspaceSession,
};
use labhost_runtime::{CrashHandler, CrashReceiver, ExecutableLocator, ServerSupervisor};
use tempfile::TempDir;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Prints an endpoint on stderr and keeps running.
pub const SERVE_SCRIPT: &str = "echo 'http://localhost:8888/?token=abc123' >&2; exec sleep 30";

/// Writes a line to stderr and exits with status 3.
pub const CRASH_SCRIPT: &str = "echo 'kernel exploded' >&2; exit 3";

pub const SHELL: &str = "/bin/sh";

pub const MISSING_EXECUTABLE: &str = "/nonexistent/bin/jupyter-lab";

/// File prompt answering from a queue; `None` once exhausted.
#[derive(Default)]
pub struct ScriptedFilePrompt {
    answers: Mutex<VecDeque<Option<PathBuf>>>,
    pub calls: AtomicUsize,
}

impl ScriptedFilePrompt {
    pub fn answering(answers: impl IntoIterator<Item = Option<PathBuf>>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FilePrompt for ScriptedFilePrompt {
    async fn prompt_for_file(
        &self,
        _window: &WindowHandle,
        _options: &FilePromptOptions,
    ) -> Option<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers.lock().unwrap().pop_front().flatten()
    }
}

/// Choice prompt answering from a queue, Close once exhausted.
///
/// When gated, each answer waits for a [`ScriptedChoicePrompt::release`].
pub struct ScriptedChoicePrompt {
    answers: Mutex<VecDeque<usize>>,
    gate: Option<Semaphore>,
    pub calls: AtomicUsize,
    pub messages: Mutex<Vec<(String, String)>>,
}

impl ScriptedChoicePrompt {
    pub fn answering(answers: impl IntoIterator<Item = usize>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            gate: None,
            calls: AtomicUsize::new(0),
            messages: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChoicePrompt for ScriptedChoicePrompt {
    async fn prompt_choice(&self, title: &str, message: &str, _buttons: &[&str]) -> usize {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.messages
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        self.answers.lock().unwrap().pop_front().unwrap_or(1)
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub urls: Mutex<Vec<(String, String)>>,
}

impl NavigationSink for RecordingNavigator {
    fn load_url(&self, window: &WindowHandle, endpoint: &Endpoint) {
        self.urls
            .lock()
            .unwrap()
            .push((window.label().to_string(), endpoint.to_string()));
    }
}

#[derive(Default)]
pub struct RecordingSession {
    pub closes: AtomicUsize,
}

impl RecordingSession {
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl WorkspaceSession for RecordingSession {
    fn window(&self) -> WindowHandle {
        WindowHandle::new("main")
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingEmitter {
    pub events: Mutex<Vec<ServerEvent>>,
}

impl RecordingEmitter {
    pub fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.name() == name)
            .count()
    }
}

impl ServerEventEmitter for RecordingEmitter {
    fn emit(&self, event: ServerEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Fully wired supervisor with recording fakes.
pub struct Harness {
    pub home: TempDir,
    pub config: LabhostConfig,
    pub store: Arc<InMemoryPreferenceStore>,
    pub files: Arc<ScriptedFilePrompt>,
    pub locator: Arc<ExecutableLocator>,
    pub navigator: Arc<RecordingNavigator>,
    pub events: Arc<RecordingEmitter>,
    pub supervisor: Arc<ServerSupervisor>,
    pub crashes: Option<CrashReceiver>,
}

impl Harness {
    /// Harness whose server runs `sh -c <script>`.
    pub fn with_script(script: &str) -> Self {
        Self::build(script, InMemoryPreferenceStore::new(), ScriptedFilePrompt::default())
    }

    pub fn build(script: &str, store: InMemoryPreferenceStore, files: ScriptedFilePrompt) -> Self {
        let home = TempDir::new().unwrap();
        let config = LabhostConfig::for_home(home.path())
            .with_registry_file(home.path().join("environments.txt"))
            .with_launch_args(["-c", script])
            .with_shutdown_grace(Duration::from_secs(1));

        let window = WindowHandle::new("main");
        let store = Arc::new(store);
        let files = Arc::new(files);
        let locator = Arc::new(ExecutableLocator::new(
            &config,
            store.clone(),
            files.clone(),
            window.clone(),
        ));
        let navigator = Arc::new(RecordingNavigator::default());
        let events = Arc::new(RecordingEmitter::default());

        let (supervisor, crashes) = ServerSupervisor::new(
            config.clone(),
            locator.clone(),
            navigator.clone(),
            window,
            events.clone(),
        );

        Self {
            home,
            config,
            store,
            files,
            locator,
            navigator,
            events,
            supervisor: Arc::new(supervisor),
            crashes: Some(crashes),
        }
    }

    pub fn home(&self) -> &Path {
        self.home.path()
    }

    /// Wire a crash handler to this harness and start it.
    pub fn spawn_crash_handler(
        &mut self,
        choices: Arc<ScriptedChoicePrompt>,
        session: Arc<RecordingSession>,
    ) -> (Arc<CrashHandler>, JoinHandle<()>) {
        let handler = Arc::new(CrashHandler::new(
            self.supervisor.clone(),
            self.locator.clone(),
            choices,
            session,
            self.events.clone(),
        ));
        let crashes = self.crashes.take().expect("crash receiver already taken");
        let task = handler.clone().spawn(crashes);
        (handler, task)
    }
}

/// Poll `condition` until it holds or five seconds pass.
pub async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..250 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
