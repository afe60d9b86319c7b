//! # Relay Frame Protocol
//!
//! Every outbound frame is a plain WebSocket text frame. Streamed reply
//! fragments are sent unwrapped, one frame per delta, between the in-progress
//! notice and the terminal marker.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use crate::core::CompletionError;

/// Sent once when a client connects
pub const WELCOME: &str = "Welcome to the WebSocket server!";

/// Sent once per accepted request, before any fragment
pub const IN_PROGRESS: &str = "AIに問い合わせ中...";

/// Terminal marker after a clean completion
pub const STREAM_END: &str = "__AI_STREAM_END__";

/// Guidance when no persona could be resolved
pub const PERSONA_REQUIRED: &str = "characterIdまたは@コマンドでキャラクターを指定してください";

/// Persona prompt document could not be read
pub const PROMPT_LOAD_FAILED: &str = "キャラクタープロンプトファイルの読み込みに失敗しました";

pub const ERROR_PREFIX: &str = "AI応答エラー: ";

/// Error frame for an upstream rejection or a mid-stream transport failure.
pub fn error_frame(err: &CompletionError) -> String {
    format!("{ERROR_PREFIX}{err}")
}
