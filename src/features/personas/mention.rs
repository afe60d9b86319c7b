//! # Feature: Mention Resolver
//!
//! Decides which persona answers an inbound message. Clients either send a
//! structured `{"characterId": .., "text": ..}` object or plain text that may
//! start with a mention token such as `@kagemitsu`.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use super::{Persona, PersonaRegistry};

/// First character of every mention token
pub const MENTION_SENTINEL: char = '@';

static LEADING_MENTION: OnceLock<Regex> = OnceLock::new();
static WHOLE_MENTION: OnceLock<Regex> = OnceLock::new();

fn leading_mention_regex() -> &'static Regex {
    LEADING_MENTION.get_or_init(|| Regex::new(r"^@[A-Za-z0-9_]+").expect("valid mention regex"))
}

fn whole_mention_regex() -> &'static Regex {
    WHOLE_MENTION.get_or_init(|| Regex::new(r"^@[A-Za-z0-9_]+$").expect("valid mention regex"))
}

/// True if `token` is exactly one mention token (`@` + ASCII word characters).
pub fn is_mention_token(token: &str) -> bool {
    whole_mention_regex().is_match(token)
}

/// The mention token anchored at the start of `text`, if any.
pub fn leading_mention(text: &str) -> Option<&str> {
    leading_mention_regex().find(text).map(|m| m.as_str())
}

/// Result of decoding a raw inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundPayload {
    Structured {
        character_id: Option<String>,
        text: Option<String>,
    },
    PlainText(String),
}

impl InboundPayload {
    /// JSON object first, anything else is plain text. Fields that are not
    /// strings are treated as absent.
    pub fn decode(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(fields)) => {
                let string_field =
                    |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_owned);
                InboundPayload::Structured {
                    character_id: string_field("characterId"),
                    text: string_field("text"),
                }
            }
            _ => InboundPayload::PlainText(raw.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    Resolved { persona: &'a Persona, text: String },
    /// No persona could be determined, or the text was empty
    Unresolved,
}

/// Resolve the target persona for `raw`.
///
/// `explicit_id` wins when it names a registered persona; the raw text is then
/// passed through unchanged. Otherwise the payload is decoded and its
/// `characterId` is tried, then the leading mention token of the text. The
/// mention is left in the text. Only the first token is considered.
pub fn resolve<'a>(
    raw: &str,
    explicit_id: Option<&str>,
    registry: &'a PersonaRegistry,
) -> Resolution<'a> {
    if let Some(persona) = explicit_id.and_then(|id| registry.find_by_id(id)) {
        return finish(Some(persona), raw.to_string());
    }

    let (character_id, text) = match InboundPayload::decode(raw) {
        InboundPayload::Structured { character_id, text } => {
            (character_id, text.unwrap_or_default())
        }
        InboundPayload::PlainText(text) => (None, text),
    };

    let persona = character_id
        .as_deref()
        .and_then(|id| registry.find_by_id(id))
        .or_else(|| leading_mention(&text).and_then(|token| registry.find_by_mention(token)));

    finish(persona, text)
}

fn finish(persona: Option<&Persona>, text: String) -> Resolution<'_> {
    match persona {
        Some(persona) if !text.is_empty() => Resolution::Resolved { persona, text },
        _ => Resolution::Unresolved,
    }
}
