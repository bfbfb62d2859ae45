//! Terminal front end for labhost.
//!
//! Wires `labhost-runtime` to terminal prompts so a notebook server can be
//! supervised without a desktop shell.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by the binary only
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod handlers;
pub mod parser;
pub mod runtime;
pub mod terminal;

pub use bootstrap::{CliContext, bootstrap, build_config, config_from_env};
pub use parser::Cli;
