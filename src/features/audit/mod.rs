//! # Audit Feature
//!
//! Append-only JSON-lines record of every outgoing completion request. The
//! record captures the request (persona + full message list), not the reply.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Initial release

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use log::warn;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::features::personas::Persona;
use crate::features::session::Turn;

#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    #[serde(serialize_with = "rfc3339_millis")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "characterId")]
    pub persona_id: String,
    #[serde(rename = "characterName")]
    pub persona_name: String,
    pub messages: Vec<Turn>,
}

fn rfc3339_millis<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl AuditRecord {
    pub fn new(persona: &Persona, messages: &[Turn]) -> Self {
        AuditRecord {
            timestamp: Utc::now(),
            persona_id: persona.id.clone(),
            persona_name: persona.name.clone(),
            messages: messages.to_vec(),
        }
    }
}

#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    /// Serializes appends from concurrent connections
    write_lock: Mutex<()>,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        AuditLog {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line, creating parent directories.
    pub async fn append(&self, record: &AuditRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Best-effort append; failures are logged and never block the reply.
    pub async fn record(&self, record: &AuditRecord) {
        if let Err(e) = self.append(record).await {
            warn!("Failed to write audit record to {}: {e:#}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persona() -> Persona {
        Persona {
            id: "kagemitsu".to_string(),
            mention: "@kagemitsu".to_string(),
            name: "景光".to_string(),
            prompt_source: "prompts/kagemitsu.md".to_string(),
            color: None,
        }
    }

    #[tokio::test]
    async fn test_append_creates_directories_and_writes_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("logs/nested/groq_api.log"));

        let messages = vec![Turn::system("prompt"), Turn::user("hi")];
        log.append(&AuditRecord::new(&persona(), &messages)).await.unwrap();
        log.append(&AuditRecord::new(&persona(), &messages[1..])).await.unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["characterId"], "kagemitsu");
        assert_eq!(first["characterName"], "景光");
        assert_eq!(first["messages"][0]["role"], "system");
        assert_eq!(first["messages"][1]["content"], "hi");
        assert!(first["timestamp"].as_str().unwrap().ends_with('Z'));

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["messages"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_record_swallows_errors() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the log file should be makes open() fail
        let log = AuditLog::new(dir.path());
        log.record(&AuditRecord::new(&persona(), &[])).await;
        assert!(log.append(&AuditRecord::new(&persona(), &[])).await.is_err());
    }
}
