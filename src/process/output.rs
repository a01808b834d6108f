// src/process/output.rs

use std::fmt::Debug;
use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tracing::debug;

/// Destination for human-readable lines: step output and lifecycle notices.
pub trait LogSink: Send + Sync + Debug {
    /// One line written by a step on stdout or stderr.
    fn output(&self, step: &str, line: &str);

    /// A lifecycle notice (restart, failure, shutdown).
    fn notice(&self, message: &str);
}

/// Passes step output straight through to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn output(&self, _step: &str, line: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{line}");
    }

    fn notice(&self, message: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "[relaunch] {message}");
    }
}

/// Forward the child's stdout and stderr to `sink`, one line at a time.
///
/// Fire-and-forget: the reader tasks end when the pipes close.
pub fn forward_output(child: &mut Child, step: &str, sink: Arc<dyn LogSink>) {
    if let Some(stdout) = child.stdout.take() {
        spawn_line_reader(stdout, step.to_string(), "stdout", Arc::clone(&sink));
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_line_reader(stderr, step.to_string(), "stderr", sink);
    }
}

fn spawn_line_reader<R>(pipe: R, step: String, stream: &'static str, sink: Arc<dyn LogSink>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(pipe).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            sink.output(&step, &line);
        }
        debug!(step = %step, stream, "output stream closed");
    });
}
