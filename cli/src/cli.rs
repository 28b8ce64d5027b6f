use clap::Parser;
use memchat_core::AppConfig;
use std::path::PathBuf;

/// Terminal chat with long-term memory
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Send one message and exit instead of starting the interactive loop
    #[arg(index = 1)]
    pub prompt: Option<String>,

    /// Path to the configuration file
    #[arg(short, long, env = "MEMCHAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Identity that scopes memory search and storage
    #[arg(short, long)]
    pub user_id: Option<String>,

    /// Chat model to use
    #[arg(short, long)]
    pub model: Option<String>,

    /// Let the classifier decide what to remember instead of asking
    #[arg(long, default_value_t = false, conflicts_with = "no_memory")]
    pub auto_memory: bool,

    /// Never store exchanges
    #[arg(long, default_value_t = false)]
    pub no_memory: bool,

    /// Enable verbose output
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    /// Config values given on the command line, to merge over the file
    pub fn overrides(&self) -> AppConfig {
        AppConfig {
            user_id: self.user_id.clone(),
            model_name: self.model.clone(),
            ..Default::default()
        }
    }
}
