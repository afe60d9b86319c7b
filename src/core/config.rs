//! Environment-driven relay configuration
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";
pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_CHARACTERS_PATH: &str = "characters.json";
pub const DEFAULT_AUDIT_LOG_PATH: &str = "logs/groq_api.log";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Bearer credential for the completion API. Missing is allowed; the
    /// upstream rejection is then relayed to clients.
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
    pub characters_path: String,
    pub audit_log_path: String,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup, so tests don't have to
    /// mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("WS_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("WS_PORT must be a port number, got '{raw}'"))?,
            None => DEFAULT_PORT,
        };

        Ok(Config {
            host: lookup("WS_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            api_key: lookup("GROQ_API_KEY").filter(|key| !key.trim().is_empty()),
            model: lookup("GROQ_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_url: lookup("GROQ_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            characters_path: lookup("CHARACTERS_PATH")
                .unwrap_or_else(|| DEFAULT_CHARACTERS_PATH.to_string()),
            audit_log_path: lookup("AUDIT_LOG_PATH")
                .unwrap_or_else(|| DEFAULT_AUDIT_LOG_PATH.to_string()),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}
