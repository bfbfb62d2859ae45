//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where the runtime is wired to the terminal
//! adapters. Everything concrete is instantiated here:
//! - JSON preference store
//! - Terminal prompts, navigator and session
//! - Locator, supervisor and crash handler (via labhost-runtime)

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use labhost_core::{ConfigError, EnvProvider, LabhostConfig, SystemEnv, WorkspaceSession};
use labhost_runtime::{
    CrashHandler, CrashReceiver, ExecutableLocator, JsonPreferenceStore, ServerEventBroadcaster,
    ServerSupervisor,
};

use crate::parser::Cli;
use crate::terminal::{TerminalNavigator, TerminalPrompt, TerminalSession};

/// Build the configuration from the environment plus command-line overrides.
pub fn build_config(cli: &Cli, env: &dyn EnvProvider) -> Result<LabhostConfig, ConfigError> {
    let mut config = LabhostConfig::from_env_provider(env)?;

    if let Some(binary) = &cli.binary {
        config = config.with_binary_name(binary);
    }
    if let Some(registry) = &cli.registry {
        config = config.with_registry_file(registry);
    }
    if let Some(secs) = cli.grace_secs {
        config = config.with_shutdown_grace(Duration::from_secs(secs));
    }

    Ok(config)
}

/// Fully composed runtime for the `labhost` binary.
pub struct CliContext {
    pub config: LabhostConfig,
    pub locator: Arc<ExecutableLocator>,
    pub supervisor: Arc<ServerSupervisor>,
    pub crash_handler: Arc<CrashHandler>,
    pub session: Arc<TerminalSession>,
    pub events: Arc<ServerEventBroadcaster>,
    crashes: Option<CrashReceiver>,
}

impl CliContext {
    /// Hand the crash report stream to whoever drives the crash handler.
    pub fn take_crash_receiver(&mut self) -> Result<CrashReceiver> {
        self.crashes
            .take()
            .context("Crash receiver was already taken")
    }
}

/// Wire the runtime to terminal adapters.
pub fn bootstrap(config: LabhostConfig) -> CliContext {
    let store = Arc::new(JsonPreferenceStore::new(&config.preferences_file));
    let prompt = Arc::new(TerminalPrompt::new());
    let session = Arc::new(TerminalSession::new());
    let window = session.window();

    let locator = Arc::new(ExecutableLocator::new(
        &config,
        store,
        prompt.clone(),
        window.clone(),
    ));
    let events = Arc::new(ServerEventBroadcaster::new());

    let (supervisor, crashes) = ServerSupervisor::new(
        config.clone(),
        locator.clone(),
        Arc::new(TerminalNavigator::new()),
        window,
        events.clone(),
    );
    let supervisor = Arc::new(supervisor);

    let crash_handler = Arc::new(
        CrashHandler::new(
            supervisor.clone(),
            locator.clone(),
            prompt,
            session.clone(),
            events.clone(),
        )
        .with_display_name(config.display_name.clone()),
    );

    CliContext {
        config,
        locator,
        supervisor,
        crash_handler,
        session,
        events,
        crashes: Some(crashes),
    }
}

/// Configuration from the real process environment.
pub fn config_from_env(cli: &Cli) -> Result<LabhostConfig> {
    build_config(cli, &SystemEnv).context("Failed to load configuration")
}
