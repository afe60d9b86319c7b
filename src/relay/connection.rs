//! # Relay Connection
//!
//! Per-connection state machine. Each connection owns its `Session` and
//! handles inbound messages strictly one at a time:
//!
//! `Idle` -> resolve persona -> load prompt -> audit -> in-progress notice ->
//! `AwaitingUpstream` -> relay fragments -> `Idle`
//!
//! Messages that arrive while a reply is streaming are queued (up to
//! `MAX_PENDING`) and handled after it finishes. Once the queue is full the
//! inbound channel is no longer read, so backpressure reaches the socket. A
//! closed inbound channel means the client is gone; the in-flight stream is
//! dropped, queued messages are discarded and the session goes with them.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use log::{debug, info, warn};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::protocol::{error_frame, IN_PROGRESS, PERSONA_REQUIRED, PROMPT_LOAD_FAILED, STREAM_END, WELCOME};
use super::RelayContext;
use crate::features::audit::AuditRecord;
use crate::features::completion::{FragmentStream, StreamEvent};
use crate::features::personas::{resolve, Resolution};
use crate::features::session::{Session, Turn};

/// Messages held back while a reply streams
pub const MAX_PENDING: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    AwaitingUpstream,
}

/// How a single inbound message was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// No persona; guidance sent
    Unresolved,
    /// Prompt document unreadable; error sent, upstream not contacted
    PromptUnavailable,
    /// Reply streamed and both turns recorded
    Completed,
    /// Upstream rejected or broke mid-stream; error sent, nothing recorded
    Failed,
    /// Client went away
    Abandoned,
}

pub struct Connection {
    id: Uuid,
    ctx: Arc<RelayContext>,
    session: Session,
    state: RelayState,
    pending: VecDeque<String>,
}

impl Connection {
    pub fn new(ctx: Arc<RelayContext>) -> Self {
        Connection {
            id: Uuid::new_v4(),
            ctx,
            session: Session::new(),
            state: RelayState::Idle,
            pending: VecDeque::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Messages received while a reply was streaming, not yet handled
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drive the connection until the client disconnects. Frames are written
    /// to `outbound`; the session is dropped on return.
    pub async fn run(mut self, mut inbound: mpsc::Receiver<String>, outbound: mpsc::Sender<String>) {
        info!("[{}] Client connected", self.id);

        if outbound.send(WELCOME.to_string()).await.is_ok() {
            loop {
                if !self.pending.is_empty() && inbound.is_closed() {
                    debug!(
                        "[{}] Client gone, dropping {} queued messages",
                        self.id,
                        self.pending.len()
                    );
                    break;
                }
                let raw = match self.pending.pop_front() {
                    Some(raw) => raw,
                    None => match inbound.recv().await {
                        Some(raw) => raw,
                        None => break,
                    },
                };
                if outbound.is_closed() {
                    break;
                }

                let outcome = self.handle_message(raw, &mut inbound, &outbound).await;
                if outcome == ExchangeOutcome::Abandoned {
                    break;
                }
            }
        }

        info!(
            "[{}] Client disconnected, discarding session ({} turns)",
            self.id,
            self.session.len()
        );
    }

    /// Handle one inbound message to completion. `inbound` is polled while the
    /// reply streams so queued messages and disconnects are noticed.
    pub async fn handle_message(
        &mut self,
        raw: String,
        inbound: &mut mpsc::Receiver<String>,
        outbound: &mpsc::Sender<String>,
    ) -> ExchangeOutcome {
        let ctx = Arc::clone(&self.ctx);

        let (persona, text) = match resolve(&raw, None, &ctx.registry) {
            Resolution::Resolved { persona, text } => (persona, text),
            Resolution::Unresolved => {
                debug!("[{}] No persona in message, sending guidance", self.id);
                return send_or_abandon(outbound, PERSONA_REQUIRED, ExchangeOutcome::Unresolved).await;
            }
        };
        debug!(
            "[{}] Routing to persona '{}' | Message: '{}'",
            self.id,
            persona.id,
            text.chars().take(100).collect::<String>()
        );

        let system_prompt = match ctx.prompts.load(persona).await {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!("[{}] {e}", self.id);
                return send_or_abandon(outbound, PROMPT_LOAD_FAILED, ExchangeOutcome::PromptUnavailable)
                    .await;
            }
        };

        let user_turn = Turn::user(text);
        let messages = self
            .session
            .request_messages(Turn::system(system_prompt), user_turn.clone());
        ctx.audit.record(&AuditRecord::new(persona, &messages)).await;

        if outbound.send(IN_PROGRESS.to_string()).await.is_err() {
            return ExchangeOutcome::Abandoned;
        }

        self.state = RelayState::AwaitingUpstream;
        let stream = ctx.completion.stream_complete(messages).await;
        let outcome = self.relay_stream(stream, user_turn, inbound, outbound).await;
        self.state = RelayState::Idle;

        debug!("[{}] Exchange finished: {:?}", self.id, outcome);
        outcome
    }

    async fn relay_stream(
        &mut self,
        mut stream: FragmentStream,
        user_turn: Turn,
        inbound: &mut mpsc::Receiver<String>,
        outbound: &mpsc::Sender<String>,
    ) -> ExchangeOutcome {
        let mut reply = String::new();

        loop {
            tokio::select! {
                event = stream.next() => {
                    let Some(event) = event else {
                        return ExchangeOutcome::Failed;
                    };
                    match event {
                        StreamEvent::Fragment(fragment) => {
                            if outbound.send(fragment.clone()).await.is_err() {
                                return ExchangeOutcome::Abandoned;
                            }
                            reply.push_str(&fragment);
                        }
                        StreamEvent::End => {
                            self.session.append_exchange(user_turn, Turn::assistant(reply));
                            return send_or_abandon(outbound, STREAM_END, ExchangeOutcome::Completed).await;
                        }
                        StreamEvent::Error(e) => {
                            warn!("[{}] Completion failed: {e}", self.id);
                            return send_or_abandon(outbound, &error_frame(&e), ExchangeOutcome::Failed).await;
                        }
                    }
                }
                incoming = inbound.recv(), if self.pending.len() < MAX_PENDING => match incoming {
                    Some(raw) => {
                        debug!("[{}] Queued message while awaiting upstream", self.id);
                        self.pending.push_back(raw);
                    }
                    None => {
                        info!("[{}] Client disconnected mid-stream, abandoning request", self.id);
                        return ExchangeOutcome::Abandoned;
                    }
                },
            }
        }
    }
}

async fn send_or_abandon(
    outbound: &mpsc::Sender<String>,
    frame: &str,
    outcome: ExchangeOutcome,
) -> ExchangeOutcome {
    match outbound.send(frame.to_string()).await {
        Ok(()) => outcome,
        Err(_) => ExchangeOutcome::Abandoned,
    }
}
