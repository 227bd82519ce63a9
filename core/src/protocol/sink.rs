use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::ExecutionResult;

/// Output channel for a progress line. Mirrors stdout vs stderr of the
/// backend process itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Primary,
    Diagnostic,
}

/// Where protocol lines go.
///
/// Passed explicitly to every component instead of writing to ambient
/// streams, so tests and embedders can capture output.
#[async_trait]
pub trait ProtocolSink: Send + Sync {
    /// Writes one advisory line immediately, unbuffered.
    async fn progress(&self, text: &str, channel: Channel);

    /// Writes the terminal record. Called exactly once per invocation,
    /// after all progress lines for that invocation.
    async fn result(&self, result: &ExecutionResult);
}

/// Writes protocol lines to the real stdout/stderr, flushing per line so a
/// consumer reading the pipe sees each line as soon as it is produced.
#[derive(Default)]
pub struct StdioSink;

impl StdioSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProtocolSink for StdioSink {
    async fn progress(&self, text: &str, channel: Channel) {
        match channel {
            Channel::Primary => write_line(tokio::io::stdout(), text).await,
            Channel::Diagnostic => write_line(tokio::io::stderr(), text).await,
        }
    }

    async fn result(&self, result: &ExecutionResult) {
        write_line(tokio::io::stdout(), &result.to_line()).await;
    }
}

async fn write_line<W>(mut wr: W, text: &str)
where
    W: AsyncWrite + Unpin,
{
    let _ = wr.write_all(text.as_bytes()).await;
    let _ = wr.write_all(b"\n").await;
    let _ = wr.flush().await;
}

/// One emitted protocol line, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum Emitted {
    Progress { channel: Channel, text: String },
    Result(ExecutionResult),
}

/// Captures emitted lines in memory. Used by tests and by embedders that
/// consume the protocol without going through a pipe.
#[derive(Default)]
pub struct BufferSink {
    events: Mutex<Vec<Emitted>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything emitted so far, in order.
    pub fn events(&self) -> Vec<Emitted> {
        self.events.lock().unwrap().clone()
    }

    pub fn progress_lines(&self) -> Vec<(Channel, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Emitted::Progress { channel, text } => Some((channel, text)),
                Emitted::Result(_) => None,
            })
            .collect()
    }

    pub fn results(&self) -> Vec<ExecutionResult> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Emitted::Result(r) => Some(r),
                Emitted::Progress { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl ProtocolSink for BufferSink {
    async fn progress(&self, text: &str, channel: Channel) {
        self.events.lock().unwrap().push(Emitted::Progress {
            channel,
            text: text.to_string(),
        });
    }

    async fn result(&self, result: &ExecutionResult) {
        self.events
            .lock()
            .unwrap()
            .push(Emitted::Result(result.clone()));
    }
}
