//! Terminating the notebook server: polite signal first, kill after a grace period.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;

#[cfg(unix)]
use tokio::time::timeout;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Stop `child` and reap it.
///
/// On Unix the server gets SIGTERM so Jupyter can shut its kernels down, and
/// is killed if it is still alive after `grace`. Elsewhere it is killed
/// straight away. A child that already exited is just reaped.
pub async fn shutdown_child(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        shutdown_unix(child, grace).await
    }

    #[cfg(not(unix))]
    {
        let _ = grace;
        shutdown_windows(child).await
    }
}

#[cfg(unix)]
async fn shutdown_unix(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    // Already reaped: nothing to signal
    let Some(pid) = child.id() else {
        return child.wait().await;
    };

    let raw_pid = i32::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;

    if let Err(e) = signal::kill(Pid::from_raw(raw_pid), Signal::SIGTERM) {
        // Exited between the id check and the signal
        if e == nix::errno::Errno::ESRCH {
            return child.wait().await;
        }
        return Err(io::Error::other(e));
    }

    if let Ok(result) = timeout(grace, child.wait()).await {
        return result;
    }

    tracing::debug!(pid, ?grace, "Server ignored SIGTERM, killing");
    child.kill().await?;
    child.wait().await
}

#[cfg(not(unix))]
async fn shutdown_windows(child: &mut Child) -> io::Result<ExitStatus> {
    child.kill().await?;
    child.wait().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::process::Command;
    use tokio::time::sleep;

    #[tokio::test]
    #[cfg(unix)]
    async fn shutdown_responds_to_sigterm() {
        let mut child = Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("failed to spawn sleep");

        let status = shutdown_child(&mut child, Duration::from_secs(5)).await;
        assert!(status.is_ok());
        assert!(!status.unwrap().success());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn shutdown_escalates_when_sigterm_is_ignored() {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg("trap '' TERM; sleep 30")
            .spawn()
            .expect("failed to spawn sh");

        // Let the shell install its trap
        sleep(Duration::from_millis(200)).await;

        let status = shutdown_child(&mut child, Duration::from_millis(200)).await;
        assert!(status.is_ok());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn shutdown_handles_already_exited() {
        let mut child = Command::new("echo")
            .arg("test")
            .spawn()
            .expect("failed to spawn echo");

        // Give it time to exit
        sleep(Duration::from_millis(100)).await;

        let result = shutdown_child(&mut child, Duration::from_secs(1)).await;
        assert!(result.is_ok());
    }
}
