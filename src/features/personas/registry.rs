//! # Feature: Persona Registry
//!
//! Loads the persona document (a list of `{id, mention, name, prompt_file}`
//! entries) and indexes it by id and by mention. Read-only after load, so it is
//! shared across connections behind an `Arc` with no locking.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: YAML documents selected by `.yaml`/`.yml` extension
//! - 1.0.0: Initial release

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::mention::is_mention_token;
use crate::core::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Persona {
    pub id: String,
    /// Inline address token, e.g. `@kagemitsu`
    pub mention: String,
    /// Display name
    pub name: String,
    /// Path of the system-prompt document
    #[serde(rename = "prompt_file")]
    pub prompt_source: String,
    /// Display accent color, only meaningful to clients
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PersonaRegistry {
    personas: Vec<Persona>,
    by_id: HashMap<String, usize>,
    by_mention: HashMap<String, usize>,
}

impl PersonaRegistry {
    /// Load and validate the persona document at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );
        let personas: Vec<Persona> = if is_yaml {
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Malformed(e.to_string()))?
        } else {
            serde_json::from_str(&contents).map_err(|e| ConfigError::Malformed(e.to_string()))?
        };

        Self::from_personas(personas)
    }

    /// Build a registry, enforcing id and mention uniqueness.
    pub fn from_personas(personas: Vec<Persona>) -> Result<Self, ConfigError> {
        let mut by_id = HashMap::with_capacity(personas.len());
        let mut by_mention = HashMap::with_capacity(personas.len());

        for (index, persona) in personas.iter().enumerate() {
            if persona.id.is_empty() {
                return Err(ConfigError::Malformed("persona with empty id".to_string()));
            }
            if !is_mention_token(&persona.mention) {
                return Err(ConfigError::InvalidMention {
                    id: persona.id.clone(),
                    mention: persona.mention.clone(),
                });
            }
            if by_id.insert(persona.id.clone(), index).is_some() {
                return Err(ConfigError::DuplicateId(persona.id.clone()));
            }
            if by_mention.insert(persona.mention.clone(), index).is_some() {
                return Err(ConfigError::DuplicateMention(persona.mention.clone()));
            }
        }

        Ok(PersonaRegistry {
            personas,
            by_id,
            by_mention,
        })
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Persona> {
        self.by_id.get(id).map(|&index| &self.personas[index])
    }

    pub fn find_by_mention(&self, token: &str) -> Option<&Persona> {
        self.by_mention.get(token).map(|&index| &self.personas[index])
    }

    /// Personas in document order
    pub fn personas(&self) -> &[Persona] {
        &self.personas
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}
