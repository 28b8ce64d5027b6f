// Core memchat functionality:
// - Chat completion client
// - Message types and rolling history
// - Configuration and credential loading
// - Prompt assembly and the memory relevance classifier
// - The per-turn conversation procedure shared by every front end

// Export client module - chat completion provider
pub mod client;
pub use client::*;

// Export types module - request/response data structures
pub mod types;
pub use types::*;

// Export config module - configuration loading
pub mod config;
pub use config::*;

// Export errors module - shared error types
pub mod errors;
pub use errors::*;

pub mod classifier;
pub mod coordinator;
pub mod history;
pub mod memory;
pub mod prompt;
pub mod session;

pub use coordinator::{ConversationEngine, Frontend, MemoryOutcome, TurnStatus, TurnSummary};
pub use history::RollingHistory;
pub use memory::{MemoryItem, MemoryProvider};
pub use session::{MemoryPolicy, SessionContext};
