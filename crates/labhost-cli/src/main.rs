//! CLI entry point - the composition root.
//!
//! Loads `.env` overrides, installs logging, wires the runtime through
//! bootstrap and hands control to the run handler on a runtime that is shut
//! down with a timeout.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use labhost_cli::{Cli, bootstrap, config_from_env, handlers, runtime};

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    // User overrides live next to the preference file; a local .env wins.
    dotenvy::dotenv().ok();
    if let Ok(path) = labhost_core::paths::env_file_path() {
        dotenvy::from_path(path).ok();
    }

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config_from_env(&cli)?;

    // A crash dialog may still be waiting on stdin after Ctrl-C.
    runtime::block_on(async {
        let ctx = bootstrap(config);
        handlers::run::execute(ctx, &cli).await
    })?
}
