use anyhow::Result;
use log::{error, info};
use std::sync::Arc;

use persona_relay::core::Config;
use persona_relay::relay::{RelayContext, RelayServer};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env, then .env.local overrides
    dotenvy::dotenv().ok();
    dotenvy::from_filename_override(".env.local").ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting persona relay...");

    if config.api_key.is_none() {
        error!("GROQ_API_KEY is not set; upstream requests will be rejected");
    }

    let ctx = RelayContext::from_config(&config)?;
    info!(
        "📄 Loaded {} personas from {}",
        ctx.registry.len(),
        config.characters_path
    );
    for persona in ctx.registry.personas() {
        info!("  {} ({}) -> {}", persona.mention, persona.name, persona.prompt_source);
    }
    info!("Model: {} | Audit log: {}", config.model, config.audit_log_path);

    let server = RelayServer::bind(config.bind_addr()?, Arc::new(ctx)).await?;
    server.run().await
}
