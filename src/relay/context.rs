//! Shared, read-only dependencies handed to every connection.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::core::Config;
use crate::features::audit::AuditLog;
use crate::features::completion::{CompletionClient, HttpCompletionClient};
use crate::features::personas::{PersonaRegistry, PromptLoader};

pub struct RelayContext {
    pub registry: PersonaRegistry,
    pub prompts: PromptLoader,
    pub completion: Arc<dyn CompletionClient>,
    pub audit: AuditLog,
}

impl RelayContext {
    pub fn new(
        registry: PersonaRegistry,
        prompts: PromptLoader,
        completion: Arc<dyn CompletionClient>,
        audit: AuditLog,
    ) -> Self {
        RelayContext {
            registry,
            prompts,
            completion,
            audit,
        }
    }

    /// Load the persona registry and wire the HTTP completion client. Prompt
    /// paths are resolved relative to the persona document's directory.
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = PersonaRegistry::load(&config.characters_path)
            .with_context(|| format!("loading personas from {}", config.characters_path))?;

        let prompts = match Path::new(&config.characters_path).parent() {
            Some(dir) if !dir.as_os_str().is_empty() => PromptLoader::with_base_dir(dir),
            _ => PromptLoader::new(),
        };

        Ok(Self::new(
            registry,
            prompts,
            Arc::new(HttpCompletionClient::from_config(config)),
            AuditLog::new(&config.audit_log_path),
        ))
    }
}
