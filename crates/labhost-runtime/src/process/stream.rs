//! Diagnostic stream reader.
//!
//! Reads raw bytes from the child's stderr and feeds each read to the
//! scanner as one chunk. Byte-based reads keep going through non-UTF8 output.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::scanner::OutputScanner;

const READ_BUFFER_SIZE: usize = 4096;

pub fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    scanner: Arc<Mutex<OutputScanner>>,
    pid: u32,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut stream = stream;
        let mut buf = vec![0u8; READ_BUFFER_SIZE];

        loop {
            match stream.read(&mut buf).await {
                Ok(0) => break, // EOF
                Ok(n) => {
                    let chunk = &buf[..n];
                    debug!(
                        target: "labhost::server",
                        pid = %pid,
                        "{}",
                        String::from_utf8_lossy(chunk).trim_end()
                    );
                    if let Ok(mut scanner) = scanner.lock() {
                        scanner.push(chunk);
                    }
                }
                Err(e) => {
                    debug!(pid = %pid, error = %e, "stderr reader exiting due to read error");
                    break;
                }
            }
        }

        if let Ok(mut scanner) = scanner.lock() {
            scanner.finish();
        }
        debug!(pid = %pid, "stderr reader task exiting");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use labhost_core::Endpoint;

    #[tokio::test]
    async fn test_reader_feeds_scanner_until_eof() {
        let scanner = Arc::new(Mutex::new(OutputScanner::new()));
        let input: &[u8] = b"booting\n[I] http://localhost:8890/?token=0123abcd\n";

        spawn_stream_reader(input, scanner.clone(), 1).await.unwrap();

        let scanner = scanner.lock().unwrap();
        assert_eq!(
            scanner.endpoint(),
            Some(&Endpoint::new("http://localhost:8890/?token=0123abcd"))
        );
        assert!(scanner.transcript().starts_with("booting\n"));
    }

    #[tokio::test]
    async fn test_reader_survives_invalid_utf8() {
        let scanner = Arc::new(Mutex::new(OutputScanner::new()));
        let input: &[u8] = b"\xff\xfe garbage http://localhost:1/?token=ff";

        spawn_stream_reader(input, scanner.clone(), 1).await.unwrap();

        let scanner = scanner.lock().unwrap();
        assert_eq!(
            scanner.endpoint(),
            Some(&Endpoint::new("http://localhost:1/?token=ff"))
        );
    }
}
