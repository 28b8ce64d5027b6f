use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::types::ChatMessage;

/// One stored memory as returned by a memory provider search
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MemoryItem {
    #[serde(default)]
    pub id: Option<String>,
    /// Result objects without memory text are ignored
    #[serde(default)]
    pub memory: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

impl MemoryItem {
    pub fn text(memory: impl Into<String>) -> Self {
        Self {
            id: None,
            memory: Some(memory.into()),
            score: None,
        }
    }
}

/// A hosted memory store scoped by user identity
#[async_trait]
pub trait MemoryProvider: Send + Sync {
    /// Searches memories relevant to `query` belonging to `user_id`.
    async fn search(&self, query: &str, user_id: &str) -> anyhow::Result<Vec<MemoryItem>>;

    /// Persists `messages` under `user_id`. Providers may process the write asynchronously.
    async fn add(&self, messages: &[ChatMessage], user_id: &str) -> anyhow::Result<()>;
}

/// Returns memory snippets relevant to `query`. Provider failures degrade to an empty list.
pub async fn search_memories(
    provider: &dyn MemoryProvider,
    query: &str,
    user_id: &str,
) -> Vec<String> {
    match provider.search(query, user_id).await {
        Ok(items) => {
            let memories: Vec<String> = items.into_iter().filter_map(|item| item.memory).collect();
            debug!(count = memories.len(), user_id, "Memory search finished");
            memories
        }
        Err(e) => {
            warn!(error = %e, user_id, "Memory search failed, continuing without memories");
            Vec::new()
        }
    }
}

/// Persists one exchange as a user/assistant pair. Returns whether the provider accepted it.
pub async fn store_memory(
    provider: &dyn MemoryProvider,
    input: &str,
    reply: &str,
    user_id: &str,
) -> bool {
    let messages = [ChatMessage::user(input), ChatMessage::assistant(reply)];
    match provider.add(&messages, user_id).await {
        Ok(()) => {
            info!(user_id, "Memory stored");
            true
        }
        Err(e) => {
            warn!(error = %e, user_id, "Memory storage failed");
            false
        }
    }
}
