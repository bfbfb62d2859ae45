//! Endpoint extraction from the server's diagnostic stream.
//!
//! Jupyter prints its connection URL (with a one-time token) on stderr. The
//! scanner is fed raw chunks as they arrive, keeps the full transcript for
//! crash diagnostics, and reports the first URL it finds exactly once.
//!
//! Chunk boundaries are arbitrary, so an unmatched tail of up to
//! [`MAX_PATTERN_LEN`] bytes is carried into the next chunk. A match that runs
//! to the very end of the buffered text is held back until more output (or
//! end of stream) shows the token is complete.

use std::sync::LazyLock;

use labhost_core::Endpoint;
use regex::Regex;

/// Longest URL we expect to match; bounds the carried-over tail.
pub const MAX_PATTERN_LEN: usize = 256;

static ENDPOINT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"http://localhost:[0-9]+/\?token=[a-f0-9]+").expect("endpoint pattern is valid")
});

type EndpointCallback = Box<dyn FnOnce(&Endpoint) + Send>;

/// Incremental scanner for one process lifetime.
#[derive(Default)]
pub struct OutputScanner {
    transcript: String,
    pending: String,
    endpoint: Option<Endpoint>,
    on_endpoint: Option<EndpointCallback>,
}

impl OutputScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the callback fired when the endpoint is first found.
    #[must_use]
    pub fn on_endpoint(mut self, callback: impl FnOnce(&Endpoint) + Send + 'static) -> Self {
        self.on_endpoint = Some(Box::new(callback));
        self
    }

    /// Feed a raw chunk. Returns the endpoint if this chunk completed it.
    pub fn push(&mut self, chunk: &[u8]) -> Option<Endpoint> {
        self.push_str(&String::from_utf8_lossy(chunk))
    }

    /// Feed a text chunk. Returns the endpoint if this chunk completed it.
    pub fn push_str(&mut self, chunk: &str) -> Option<Endpoint> {
        self.transcript.push_str(chunk);

        if self.endpoint.is_some() {
            return None;
        }

        self.pending.push_str(chunk);
        self.scan(false)
    }

    /// Signal end of stream, accepting a match that ends the output.
    pub fn finish(&mut self) -> Option<Endpoint> {
        if self.endpoint.is_some() {
            return None;
        }
        self.scan(true)
    }

    /// The discovered endpoint, if any.
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    /// Everything received so far, in arrival order.
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    fn scan(&mut self, at_eof: bool) -> Option<Endpoint> {
        let Some(found) = ENDPOINT_PATTERN.find(&self.pending) else {
            self.trim_pending();
            return None;
        };

        let touches_end = found.end() == self.pending.len();
        if touches_end && !at_eof && found.len() < MAX_PATTERN_LEN {
            // Token may continue in the next chunk.
            let start = found.start();
            self.pending.drain(..start);
            return None;
        }

        let endpoint = Endpoint::new(found.as_str());
        self.pending.clear();
        self.endpoint = Some(endpoint.clone());

        if let Some(callback) = self.on_endpoint.take() {
            callback(&endpoint);
        }

        Some(endpoint)
    }

    fn trim_pending(&mut self) {
        if self.pending.len() <= MAX_PATTERN_LEN {
            return;
        }
        let mut cut = self.pending.len() - MAX_PATTERN_LEN;
        while !self.pending.is_char_boundary(cut) {
            cut += 1;
        }
        self.pending.drain(..cut);
    }
}

impl std::fmt::Debug for OutputScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputScanner")
            .field("transcript_len", &self.transcript.len())
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
