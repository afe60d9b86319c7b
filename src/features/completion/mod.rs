//! # Completion Feature
//!
//! Upstream streaming chat completions, exposed as a pull-based fragment
//! stream so the relay never touches the HTTP body directly.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Initial release with line-buffered event decoding

pub mod client;
pub mod stream;

pub use client::{CompletionClient, HttpCompletionClient};
pub use stream::{fragment_channel, EventLineDecoder, EventRecord, FragmentStream, StreamEvent};
