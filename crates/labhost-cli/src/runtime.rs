//! Tokio runtime ownership for the binary.
//!
//! Terminal prompts park a blocking-pool thread in `read_line`. Dropping a
//! runtime waits for those threads, so the binary shuts its runtime down with
//! a bounded timeout instead.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::runtime::Builder;

/// How long exit waits for blocking tasks before abandoning them.
pub const BLOCKING_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);

/// Run `future` to completion on a fresh multi-threaded runtime, then shut
/// the runtime down without waiting on stuck blocking tasks.
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    let output = runtime.block_on(future);
    runtime.shutdown_timeout(BLOCKING_SHUTDOWN_TIMEOUT);
    Ok(output)
}
