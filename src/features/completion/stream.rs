//! Incremental reassembly of the upstream event stream
//!
//! The completion API sends newline-delimited `data: {...}` records ending with
//! `data: [DONE]`. Reads arrive with no message-boundary guarantee, so raw
//! bytes are buffered and only complete lines are parsed. Records that don't
//! parse are skipped without ending the stream.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use log::debug;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::core::CompletionError;

/// Channel capacity between the HTTP reader task and the relay
pub const FRAGMENT_CHANNEL_CAPACITY: usize = 100;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

/// One parsed event record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventRecord {
    Delta(String),
    Done,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

/// Parse one complete line. `None` for blank, non-data, malformed, or
/// content-free records.
pub fn parse_event_line(line: &[u8]) -> Option<EventRecord> {
    let line = match std::str::from_utf8(line) {
        Ok(line) => line.trim(),
        Err(e) => {
            debug!("Skipping non-UTF-8 event line: {e}");
            return None;
        }
    };
    let data = line.strip_prefix(DATA_PREFIX)?.trim_start();
    if data == DONE_SENTINEL {
        return Some(EventRecord::Done);
    }

    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()?
            .delta
            .content
            .filter(|content| !content.is_empty())
            .map(EventRecord::Delta),
        Err(e) => {
            debug!("Skipping malformed event line: {e}");
            None
        }
    }
}

/// Byte buffer that yields records for each complete line pushed through it.
#[derive(Debug, Default)]
pub struct EventLineDecoder {
    buffer: Vec<u8>,
}

impl EventLineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<EventRecord> {
        self.buffer.extend_from_slice(chunk);

        let mut records = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(record) = parse_event_line(&line) {
                records.push(record);
            }
        }
        records
    }

    /// Bytes received after the last newline
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }
}

/// What the relay sees from one completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Fragment(String),
    End,
    Error(CompletionError),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Fragment(_))
    }
}

/// Finite, non-restartable sequence of fragments for exactly one request,
/// always closed by `End` or `Error`. Dropping it abandons the request.
#[derive(Debug)]
pub struct FragmentStream {
    rx: mpsc::Receiver<StreamEvent>,
    finished: bool,
}

/// Producer half plus the stream the relay consumes.
pub fn fragment_channel() -> (mpsc::Sender<StreamEvent>, FragmentStream) {
    let (tx, rx) = mpsc::channel(FRAGMENT_CHANNEL_CAPACITY);
    (
        tx,
        FragmentStream {
            rx,
            finished: false,
        },
    )
}

impl FragmentStream {
    /// Next event, or `None` once a terminal event has been returned.
    /// Cancel-safe, so it can sit in a `tokio::select!` branch.
    pub async fn next(&mut self) -> Option<StreamEvent> {
        if self.finished {
            return None;
        }

        let event = self.rx.recv().await.unwrap_or_else(|| {
            StreamEvent::Error(CompletionError::Transport(
                "completion stream closed unexpectedly".to_string(),
            ))
        });
        if event.is_terminal() {
            self.finished = true;
            self.rx.close();
        }
        Some(event)
    }
}
