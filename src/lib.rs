// Core layer - shared types and configuration
pub mod core;

// Features layer - personas, sessions, completions, audit
pub mod features;

// Relay layer - WebSocket server and per-connection state machine
pub mod relay;

pub use crate::core::Config;

pub use features::{
    // Audit
    AuditLog, AuditRecord,
    // Completion
    CompletionClient, FragmentStream, HttpCompletionClient, StreamEvent,
    // Personas
    Persona, PersonaRegistry, PromptLoader, Resolution,
    // Session
    Role, Session, Turn, HISTORY_WINDOW,
};

pub use relay::{Connection, RelayContext, RelayServer};
