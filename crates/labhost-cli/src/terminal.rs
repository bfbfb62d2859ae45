//! Terminal implementations of the host ports.
//!
//! Prompts block on line input, so they run on the blocking pool and never
//! stall the runtime. Output goes to stderr; stdout belongs to the server.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use console::{Term, style};
use labhost_core::{
    ChoicePrompt, Endpoint, FilePrompt, FilePromptOptions, NavigationSink, ServerEvent,
    WindowHandle, WorkspaceSession,
};
use tokio::sync::Notify;
use tracing::warn;

/// Label of the single terminal "window".
pub const TERMINAL_WINDOW: &str = "terminal";

/// Line-based file and choice prompts.
#[derive(Debug, Clone)]
pub struct TerminalPrompt {
    term: Term,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FilePrompt for TerminalPrompt {
    async fn prompt_for_file(
        &self,
        _window: &WindowHandle,
        options: &FilePromptOptions,
    ) -> Option<PathBuf> {
        let term = self.term.clone();
        let options = options.clone();

        let answer = tokio::task::spawn_blocking(move || ask_for_file(&term, &options)).await;
        match answer {
            Ok(Ok(path)) => path,
            Ok(Err(e)) => {
                warn!(error = %e, "Terminal file prompt failed");
                None
            }
            Err(e) => {
                warn!(error = %e, "Terminal file prompt task failed");
                None
            }
        }
    }
}

#[async_trait]
impl ChoicePrompt for TerminalPrompt {
    async fn prompt_choice(&self, title: &str, message: &str, buttons: &[&str]) -> usize {
        let term = self.term.clone();
        let title = title.to_string();
        let message = message.to_string();
        let buttons: Vec<String> = buttons.iter().map(ToString::to_string).collect();
        let dismissed = buttons.len();

        let answer =
            tokio::task::spawn_blocking(move || ask_for_choice(&term, &title, &message, &buttons))
                .await;
        match answer {
            Ok(Ok(index)) => index,
            Ok(Err(e)) => {
                warn!(error = %e, "Terminal choice prompt failed");
                dismissed
            }
            Err(e) => {
                warn!(error = %e, "Terminal choice prompt task failed");
                dismissed
            }
        }
    }
}

/// Ask until an existing file is given. An empty line cancels.
fn ask_for_file(term: &Term, options: &FilePromptOptions) -> io::Result<Option<PathBuf>> {
    term.write_line(&format!(
        "{} {}",
        style("?").cyan().bold(),
        style(&options.message).bold()
    ))?;
    term.write_line(&format!(
        "  Relative paths start at {}. Leave empty to cancel.",
        options.default_path.display()
    ))?;

    loop {
        term.write_str("  > ")?;
        let line = term.read_line()?;
        let Some(path) = parse_file_answer(&line, &options.default_path) else {
            return Ok(None);
        };

        if path.is_file() {
            return Ok(Some(path));
        }
        term.write_line(&format!(
            "  {} {} is not an existing file",
            style("!").yellow(),
            path.display()
        ))?;
    }
}

/// Ask until a listed button number is given. An empty line dismisses.
fn ask_for_choice(
    term: &Term,
    title: &str,
    message: &str,
    buttons: &[String],
) -> io::Result<usize> {
    term.write_line(&style(title).red().bold().to_string())?;
    for line in message.lines() {
        term.write_line(&format!("  {line}"))?;
    }
    for (index, label) in buttons.iter().enumerate() {
        term.write_line(&format!("  [{index}] {label}"))?;
    }

    loop {
        term.write_str("  > ")?;
        let line = term.read_line()?;
        match parse_choice_answer(&line, buttons) {
            ChoiceAnswer::Picked(index) => return Ok(index),
            ChoiceAnswer::Dismissed => return Ok(buttons.len()),
            ChoiceAnswer::Invalid => {
                let last = buttons.len().saturating_sub(1);
                term.write_line(&format!("  Enter a number from 0 to {last}"))?;
            }
        }
    }
}

fn parse_file_answer(line: &str, base: &Path) -> Option<PathBuf> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let path = PathBuf::from(trimmed);
    Some(if path.is_absolute() {
        path
    } else {
        base.join(path)
    })
}

#[derive(Debug, PartialEq, Eq)]
enum ChoiceAnswer {
    Picked(usize),
    Dismissed,
    Invalid,
}

/// Accepts a button index or a case-insensitive label.
fn parse_choice_answer(line: &str, buttons: &[String]) -> ChoiceAnswer {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ChoiceAnswer::Dismissed;
    }
    if let Ok(index) = trimmed.parse::<usize>() {
        return if index < buttons.len() {
            ChoiceAnswer::Picked(index)
        } else {
            ChoiceAnswer::Invalid
        };
    }
    buttons
        .iter()
        .position(|label| label.eq_ignore_ascii_case(trimmed))
        .map_or(ChoiceAnswer::Invalid, ChoiceAnswer::Picked)
}

/// Prints the server URL instead of navigating a browser window.
#[derive(Debug, Clone)]
pub struct TerminalNavigator {
    term: Term,
}

impl TerminalNavigator {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Default for TerminalNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationSink for TerminalNavigator {
    fn load_url(&self, _window: &WindowHandle, endpoint: &Endpoint) {
        let line = format!(
            "{} Jupyter Lab is ready at {}",
            style("✓").green().bold(),
            style(endpoint).underlined()
        );
        if let Err(e) = self.term.write_line(&line) {
            warn!(error = %e, url = %endpoint, "Could not print server URL");
        }
    }
}

/// Session whose lifetime is the process; `close` wakes up `main`.
#[derive(Debug, Default)]
pub struct TerminalSession {
    closed: AtomicBool,
    notify: Notify,
}

impl TerminalSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Resolves once `close` has been called.
    pub async fn closed(&self) {
        while !self.is_closed() {
            self.notify.notified().await;
        }
    }
}

impl WorkspaceSession for TerminalSession {
    fn window(&self) -> WindowHandle {
        WindowHandle::new(TERMINAL_WINDOW)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }
}

/// One-line status for lifecycle events worth showing to the user.
pub fn describe_event(event: &ServerEvent) -> Option<String> {
    match event {
        ServerEvent::Starting { executable } => Some(format!("Starting {executable}")),
        ServerEvent::Running { pid } => Some(format!("Server running (pid {pid})")),
        ServerEvent::Stopped => Some("Server stopped".to_string()),
        ServerEvent::Recovering => Some("Restarting server".to_string()),
        ServerEvent::EndpointDiscovered { .. }
        | ServerEvent::Crashed { .. }
        | ServerEvent::SessionClosed => None,
    }
}
