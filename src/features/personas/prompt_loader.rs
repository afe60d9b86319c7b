//! Per-request persona prompt loading
//!
//! Prompts are read from disk on every request and never cached, so edits to a
//! prompt document take effect on the next message.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use std::path::{Path, PathBuf};

use super::Persona;
use crate::core::PromptLoadError;

#[derive(Debug, Clone, Default)]
pub struct PromptLoader {
    /// Directory relative prompt paths are resolved against
    base_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Resolve relative prompt paths against the current working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative prompt paths against `base_dir`, typically the
    /// directory that holds the persona document.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        PromptLoader {
            base_dir: Some(base_dir.into()),
        }
    }

    pub fn resolve_path(&self, persona: &Persona) -> PathBuf {
        let source = Path::new(&persona.prompt_source);
        match &self.base_dir {
            Some(base) if source.is_relative() => base.join(source),
            _ => source.to_path_buf(),
        }
    }

    pub async fn load(&self, persona: &Persona) -> Result<String, PromptLoadError> {
        let path = self.resolve_path(persona);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| PromptLoadError {
                persona_id: persona.id.clone(),
                path,
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persona_with_source(source: &str) -> Persona {
        Persona {
            id: "kagemitsu".to_string(),
            mention: "@kagemitsu".to_string(),
            name: "Kagemitsu".to_string(),
            prompt_source: source.to_string(),
            color: None,
        }
    }

    #[tokio::test]
    async fn test_load_relative_to_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("prompts")).unwrap();
        std::fs::write(dir.path().join("prompts/kagemitsu.md"), "# Kagemitsu\nA samurai.").unwrap();

        let loader = PromptLoader::with_base_dir(dir.path());
        let prompt = loader
            .load(&persona_with_source("prompts/kagemitsu.md"))
            .await
            .unwrap();
        assert_eq!(prompt, "# Kagemitsu\nA samurai.");
    }

    #[tokio::test]
    async fn test_absolute_source_ignores_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let prompt_path = dir.path().join("abs.md");
        std::fs::write(&prompt_path, "absolute").unwrap();

        let loader = PromptLoader::with_base_dir("/somewhere/else");
        let persona = persona_with_source(prompt_path.to_str().unwrap());
        assert_eq!(loader.load(&persona).await.unwrap(), "absolute");
    }

    #[tokio::test]
    async fn test_prompt_is_reread_each_time() {
        let dir = tempfile::tempdir().unwrap();
        let prompt_path = dir.path().join("p.md");
        std::fs::write(&prompt_path, "first").unwrap();

        let loader = PromptLoader::with_base_dir(dir.path());
        let persona = persona_with_source("p.md");
        assert_eq!(loader.load(&persona).await.unwrap(), "first");

        std::fs::write(&prompt_path, "second").unwrap();
        assert_eq!(loader.load(&persona).await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_missing_prompt_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = PromptLoader::with_base_dir(dir.path());
        let err = loader
            .load(&persona_with_source("missing.md"))
            .await
            .unwrap_err();
        assert_eq!(err.persona_id, "kagemitsu");
        assert!(err.path.ends_with("missing.md"));
    }
}
