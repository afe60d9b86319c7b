//! # Personas Feature
//!
//! Fixed set of chat personas loaded once at startup, addressed either by id or
//! by an inline `@mention` token at the start of a message.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Accept YAML persona documents alongside JSON
//! - 1.1.0: Add mention resolver with structured/plain-text payload decoding
//! - 1.0.0: Initial release with registry and per-request prompt loading

pub mod mention;
pub mod prompt_loader;
pub mod registry;

pub use mention::{resolve, InboundPayload, Resolution, MENTION_SENTINEL};
pub use prompt_loader::PromptLoader;
pub use registry::{Persona, PersonaRegistry};
