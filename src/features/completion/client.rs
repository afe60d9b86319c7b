//! Streaming chat-completion client
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use async_trait::async_trait;
use futures::StreamExt;
use log::debug;
use serde::Serialize;
use tokio::sync::mpsc;

use super::stream::{fragment_channel, EventLineDecoder, EventRecord, FragmentStream, StreamEvent};
use crate::core::{CompletionError, Config};
use crate::features::session::Turn;

/// Seam between the relay and the upstream completion API.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Start a request for `messages`. Fragments are produced in order and the
    /// stream always ends with `End` or `Error`. No retries.
    async fn stream_complete(&self, messages: Vec<Turn>) -> FragmentStream;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    stream: bool,
}

/// OpenAI-compatible `/chat/completions` client with `stream: true`.
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpCompletionClient {
    pub fn new(api_url: impl Into<String>, api_key: Option<String>, model: impl Into<String>) -> Self {
        HttpCompletionClient {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key,
            model: model.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.api_url, config.api_key.clone(), &config.model)
    }

    /// Drive one request into `tx`. The request is dropped as soon as the
    /// receiving side goes away, even if the upstream is silent.
    async fn run(self, messages: Vec<Turn>, tx: mpsc::Sender<StreamEvent>) {
        let result = tokio::select! {
            result = self.stream_into(&messages, &tx) => result,
            _ = tx.closed() => {
                debug!("Relay dropped completion stream, cancelling upstream request");
                return;
            }
        };
        let terminal = match result {
            Ok(()) => StreamEvent::End,
            Err(e) => StreamEvent::Error(e),
        };
        if tx.send(terminal).await.is_err() {
            debug!("Completion stream abandoned before its terminal event");
        }
    }

    async fn stream_into(
        &self,
        messages: &[Turn],
        tx: &mpsc::Sender<StreamEvent>,
    ) -> Result<(), CompletionError> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            stream: true,
        };
        let mut request = self.http.post(&self.api_url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let mut body = response.bytes_stream();
        let mut decoder = EventLineDecoder::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| CompletionError::Transport(e.to_string()))?;
            for record in decoder.push(&chunk) {
                match record {
                    EventRecord::Delta(text) => {
                        if tx.send(StreamEvent::Fragment(text)).await.is_err() {
                            debug!("Relay dropped completion stream, discarding remaining fragments");
                            return Ok(());
                        }
                    }
                    EventRecord::Done => return Ok(()),
                }
            }
        }

        // Body ended without [DONE]; treated as a clean end
        Ok(())
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn stream_complete(&self, messages: Vec<Turn>) -> FragmentStream {
        let (tx, stream) = fragment_channel();
        tokio::spawn(self.clone().run(messages, tx));
        stream
    }
}
