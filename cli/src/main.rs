use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use memchat_core::client::GroqClient;
use memchat_core::config::{AppConfig, load_environment};
use memchat_core::errors::CoreError;
use memchat_core::{ConversationEngine, MemoryPolicy, SessionContext};
use memchat_memory::{Mem0Client, MemorySettings};
use std::sync::Arc;
use tracing::{info, warn};

mod app;
mod cli;
mod logging;
mod output;

use crate::app::{TerminalFrontend, run_chat};
use crate::cli::Args;
use crate::output::print_banner;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("{} {:#}", "❌ Fatal error:".red().bold(), e);
        if e.downcast_ref::<CoreError>().is_some_and(CoreError::is_fatal) {
            eprintln!(
                "{}",
                "Set groq_api and mem0_api in the environment, a .env file or ~/.config/memchat/config.toml"
                    .dimmed()
            );
        }
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = AppConfig::load(args.config.as_deref())?.merge(&args.overrides());
    logging::init(config.log_level.as_deref(), args.verbose);

    if let Err(e) = ctrlc::set_handler(|| {
        println!("\n\n👋 Chatbot interrupted by user.");
        std::process::exit(130);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }

    let interactive = args.prompt.is_none();
    if interactive {
        println!("🤖 Initializing Chatbot with Memory...\n");
    }

    let credentials = load_environment(&config)?;
    let chat = GroqClient::new(credentials.chat_api_key, config.chat_settings())
        .context("Failed to initialize chat client")?;
    let memory = Mem0Client::connect(credentials.memory_api_key, &MemorySettings::from(&config))
        .await
        .context("Failed to initialize memory client")?;
    let engine = ConversationEngine::new(Arc::new(chat), Arc::new(memory));

    let policy = if args.no_memory {
        MemoryPolicy::Disabled
    } else if args.auto_memory {
        MemoryPolicy::Automatic
    } else {
        MemoryPolicy::Manual
    };
    let mut session = SessionContext::new(config.user_id(), policy);
    info!(user_id = %session.user_id, ?policy, "Session started");

    let mut frontend = match args.prompt {
        Some(prompt) => TerminalFrontend::single(prompt),
        None => {
            print_banner(&session.user_id, engine.model_name());
            TerminalFrontend::interactive()
        }
    };

    run_chat(&engine, &mut session, &mut frontend).await
}
