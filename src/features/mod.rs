//! Feature layer: one module per relay concern.

pub mod audit;
pub mod completion;
pub mod personas;
pub mod session;

pub use audit::{AuditLog, AuditRecord};
pub use completion::{CompletionClient, FragmentStream, HttpCompletionClient, StreamEvent};
pub use personas::{Persona, PersonaRegistry, PromptLoader, Resolution};
pub use session::{Role, Session, Turn, HISTORY_WINDOW};
