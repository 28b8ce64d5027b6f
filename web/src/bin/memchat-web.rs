use anyhow::Context;
use clap::Parser;
use memchat_core::client::{ChatProvider, GroqClient};
use memchat_core::config::{load_environment, AppConfig, WebConfig};
use memchat_core::ConversationEngine;
use memchat_memory::{Mem0Client, MemorySettings};
use memchat_web::config::WebSettings;
use memchat_web::http_server::{self, AppState};
use memchat_web::session::InMemorySessionStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "memchat-web", about = "Browser front end for memchat")]
struct Args {
    /// Path to config file
    #[arg(short, long, env = "MEMCHAT_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP server address
    #[arg(long)]
    bind: Option<String>,

    /// Memory namespace for every session served by this process
    #[arg(short, long)]
    user_id: Option<String>,
}

impl Args {
    fn overrides(&self) -> AppConfig {
        AppConfig {
            user_id: self.user_id.clone(),
            web: WebConfig {
                bind_addr: self.bind.clone(),
                ..WebConfig::default()
            },
            ..AppConfig::default()
        }
    }
}

/// File config with command-line overrides applied
fn load_config(args: &Args) -> anyhow::Result<AppConfig> {
    Ok(AppConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?
        .merge(&args.overrides()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_deref().unwrap_or("info")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    info!("Starting memchat web server");

    let settings = WebSettings::from_config(&config)?;
    let credentials = load_environment(&config)?;

    let chat = match GroqClient::new(credentials.chat_api_key, config.chat_settings()) {
        Ok(client) => {
            info!(model = client.model_name(), "Initialized chat client");
            client
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize chat client");
            return Err(anyhow::anyhow!("Failed to initialize chat client: {}", e));
        }
    };

    let memory = Mem0Client::connect(credentials.memory_api_key, &MemorySettings::from(&config))
        .await
        .context("Failed to connect to memory provider")?;

    let engine = ConversationEngine::new(Arc::new(chat), Arc::new(memory));
    let sessions = Arc::new(InMemorySessionStore::new(settings.session_ttl));
    info!(
        user_id = %settings.user_id,
        ttl_minutes = settings.session_ttl.num_minutes(),
        "Serving sessions"
    );

    if let Err(e) = http_server::run_server(AppState::new(engine, sessions, settings)).await {
        error!(error = %e, "HTTP server failed");
        return Err(e);
    }

    info!("memchat web server shutting down");
    Ok(())
}
