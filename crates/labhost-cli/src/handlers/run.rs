//! Run the notebook server until the user quits or closes after a crash.

use anyhow::{Context, Result};
use console::{Term, style};
use labhost_core::ServerEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bootstrap::CliContext;
use crate::parser::Cli;
use crate::terminal::describe_event;

/// Start the server and block until Ctrl-C or a Close crash decision.
pub async fn execute(mut ctx: CliContext, cli: &Cli) -> Result<()> {
    let status = spawn_status_printer(ctx.events.subscribe());
    let crashes = ctx.take_crash_receiver()?;
    let handler = ctx.crash_handler.clone().spawn(crashes);

    let started = if cli.needs_explicit_resolve() {
        let executable = ctx.locator.resolve(cli.ask, !cli.no_save).await;
        ctx.supervisor.start_with(executable).await
    } else {
        ctx.supervisor.start().await
    };
    if let Err(e) = started {
        // Already routed to the crash handler.
        debug!(error = %e, "Initial launch failed");
    }

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
            info!("Interrupted, stopping {}", ctx.config.display_name);
        }
        () = ctx.session.closed() => {
            info!("Session closed");
        }
    }

    if let Err(e) = ctx.supervisor.shutdown().await {
        warn!(error = %e, "Server did not shut down cleanly");
    }

    handler.abort();
    status.abort();
    Ok(())
}

fn spawn_status_printer(mut events: broadcast::Receiver<ServerEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let term = Term::stderr();
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(line) = describe_event(&event) {
                        let line = format!("{} {line}", style("•").dim());
                        if let Err(e) = term.write_line(&line) {
                            debug!(error = %e, event = event.name(), "Could not print status");
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Status printer fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
