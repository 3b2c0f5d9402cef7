//! Routes captured stdout/stderr chunks to caller-supplied sinks.
//!
//! Each stream is drained by its own pump task reading raw 4 KiB chunks;
//! chunks are never line-split or re-buffered. Every chunk is recorded in a
//! [`Transcript`] and, if a sink is attached, forwarded to it. With merge
//! mode enabled, stderr chunks are routed to the *output* sink and transcript
//! instead, so tools that write status text to stderr are not misclassified
//! as failing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::AsyncReadExt;
use tokio::process::{ChildStderr, ChildStdout};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::debug;

/// A caller-supplied handler receiving chunks of captured output or error data.
pub type Sink = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Records every chunk forwarded to one sink, preserving chunk boundaries.
///
/// Cheaply cloneable; clones share the same underlying record. The engine
/// appends to it until settlement, after which it is stable.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    chunks: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, chunk: &[u8]) {
        self.chunks.lock().unwrap().push(chunk.to_vec());
    }

    /// Number of chunks received, i.e. how many times the stream fired.
    pub fn calls(&self) -> usize {
        self.chunks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls() == 0
    }

    /// All chunks concatenated, lossily decoded as UTF-8.
    pub fn text(&self) -> String {
        let chunks = self.chunks.lock().unwrap();
        let mut buf = Vec::new();
        for chunk in chunks.iter() {
            buf.extend_from_slice(chunk);
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Whether any single chunk contains `needle` once decoded.
    ///
    /// Mirrors asserting on individual sink calls rather than on the joined
    /// stream, which matters when chunk boundaries are part of the behavior
    /// under test.
    pub fn any_call_contains(&self, needle: &str) -> bool {
        let chunks = self.chunks.lock().unwrap();
        chunks
            .iter()
            .any(|chunk| String::from_utf8_lossy(chunk).contains(needle))
    }

    /// Whether the concatenated stream contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.text().contains(needle)
    }
}

/// One-shot gate opened by the first chunk routed to the output sink.
///
/// Also opened at stream EOF, so a program that exits without producing any
/// output cannot stall a delivery waiting on it.
#[derive(Clone)]
pub(crate) struct FirstOutput {
    notify: Arc<Notify>,
    fired: Arc<AtomicBool>,
}

impl FirstOutput {
    fn new() -> Self {
        Self {
            notify: Arc::new(Notify::new()),
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    fn fire(&self) {
        if !self.fired.swap(true, Ordering::SeqCst) {
            self.notify.notify_one();
        }
    }

    pub(crate) fn gate(&self) -> Arc<Notify> {
        self.notify.clone()
    }
}

/// Owns the pump tasks draining a child's stdout and stderr.
pub(crate) struct Router {
    output: Transcript,
    error: Transcript,
    first_output: FirstOutput,
    pumps: Vec<JoinHandle<()>>,
}

impl Router {
    /// Attach pumps to both streams. Streams are always drained, even without
    /// sinks, so the child never stalls on a full pipe buffer.
    pub(crate) fn attach(
        stdout: ChildStdout,
        stderr: ChildStderr,
        output_sink: Option<Sink>,
        error_sink: Option<Sink>,
        merge_stderr: bool,
    ) -> Self {
        let output = Transcript::new();
        let error = Transcript::new();
        let first_output = FirstOutput::new();

        let stdout_pump = pump(
            stdout,
            output_sink.clone(),
            output.clone(),
            Some(first_output.clone()),
            "stdout",
        );

        // In merge mode stderr *is* the output sink, so it participates in
        // the first-output gate as well.
        let stderr_pump = if merge_stderr {
            pump(
                stderr,
                output_sink,
                output.clone(),
                Some(first_output.clone()),
                "stderr",
            )
        } else {
            pump(stderr, error_sink, error.clone(), None, "stderr")
        };

        Self {
            output,
            error,
            first_output,
            pumps: vec![stdout_pump, stderr_pump],
        }
    }

    pub(crate) fn first_output_gate(&self) -> Arc<Notify> {
        self.first_output.gate()
    }

    /// Wait until both streams hit EOF, then hand back the transcripts.
    pub(crate) async fn drained(self) -> (Transcript, Transcript) {
        for handle in self.pumps {
            let _ = handle.await;
        }
        (self.output, self.error)
    }
}

fn pump<R>(
    mut reader: R,
    sink: Option<Sink>,
    transcript: Transcript,
    first_output: Option<FirstOutput>,
    stream: &'static str,
) -> JoinHandle<()>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buffer = [0u8; 4096];
        loop {
            match reader.read(&mut buffer).await {
                Ok(0) => break,
                Ok(n) => {
                    let chunk = &buffer[..n];
                    debug!(stream, len = n, "captured chunk");
                    transcript.record(chunk);
                    if let Some(sink) = &sink {
                        sink(chunk);
                    }
                    if let Some(gate) = &first_output {
                        gate.fire();
                    }
                }
                Err(err) => {
                    debug!(stream, error = %err, "stream read failed");
                    break;
                }
            }
        }
        if let Some(gate) = &first_output {
            gate.fire();
        }
    })
}
