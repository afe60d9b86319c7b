//! # Session Feature
//!
//! Per-connection conversation state. A `Session` is owned by its connection's
//! handler and dropped on disconnect; nothing is shared across connections.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Initial release with rolling history and request windowing

use serde::{Deserialize, Serialize};

/// Number of prior turns sent with each request
pub const HISTORY_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Turn {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Turn {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Turn {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Session {
    history: Vec<Turn>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn to the history. System turns are never stored; they are
    /// rebuilt from the resolved persona on every request.
    pub fn append_turn(&mut self, turn: Turn) {
        if turn.role == Role::System {
            return;
        }
        self.history.push(turn);
    }

    /// Record a completed exchange.
    pub fn append_exchange(&mut self, user: Turn, assistant: Turn) {
        self.append_turn(user);
        self.append_turn(assistant);
    }

    pub fn snapshot_history(&self) -> &[Turn] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// `[system] ++ last HISTORY_WINDOW turns ++ [user]`. The stored history is
    /// left untouched, so every request re-windows the full history.
    pub fn request_messages(&self, system: Turn, user: Turn) -> Vec<Turn> {
        let start = self.history.len().saturating_sub(HISTORY_WINDOW);
        let window = &self.history[start..];

        let mut messages = Vec::with_capacity(window.len() + 2);
        messages.push(system);
        messages.extend_from_slice(window);
        messages.push(user);
        messages
    }
}
