//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Run a local Jupyter Lab server and keep it alive.
///
/// The server executable is taken from the saved preference, then from the
/// first conda environment that has one, and finally asked for on the
/// terminal.
#[derive(Debug, Parser)]
#[command(name = "labhost")]
#[command(about = "Run and supervise a local Jupyter Lab server")]
#[command(version)]
pub struct Cli {
    /// Ask for the server executable even if one is saved
    #[arg(long)]
    pub ask: bool,

    /// Don't save the chosen executable for next time
    #[arg(long = "no-save")]
    pub no_save: bool,

    /// Server binary name looked up under `<env>/bin/`
    #[arg(long, value_name = "NAME")]
    pub binary: Option<String>,

    /// Conda environment registry file
    #[arg(long, value_name = "PATH")]
    pub registry: Option<PathBuf>,

    /// Seconds to wait after SIGTERM before killing the server
    #[arg(long = "grace", value_name = "SECS")]
    pub grace_secs: Option<u64>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    /// Whether startup needs its own resolution pass instead of the
    /// supervisor's default (saved, then registry, then prompt; always saved).
    pub const fn needs_explicit_resolve(&self) -> bool {
        self.ask || self.no_save
    }
}
