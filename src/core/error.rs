//! Relay error taxonomy
//!
//! Only `ConfigError` is fatal (startup). The rest are scoped to the
//! connection that triggered them and are reported back as text frames.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Persona registry could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read persona registry {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed persona registry: {0}")]
    Malformed(String),

    #[error("duplicate persona id '{0}'")]
    DuplicateId(String),

    #[error("duplicate persona mention '{0}'")]
    DuplicateMention(String),

    #[error("persona '{id}' has invalid mention '{mention}' (expected @ followed by word characters)")]
    InvalidMention { id: String, mention: String },
}

/// A persona's prompt document could not be read.
#[derive(Debug, Error)]
#[error("failed to read prompt for persona '{persona_id}' from {path}: {source}")]
pub struct PromptLoadError {
    pub persona_id: String,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Upstream completion failures. Neither variant is retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    /// Non-2xx response, checked before any streaming.
    #[error("upstream returned {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Request or body read failed.
    #[error("{0}")]
    Transport(String),
}
