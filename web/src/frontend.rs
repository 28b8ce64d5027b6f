use async_trait::async_trait;
use memchat_core::errors::CoreError;
use memchat_core::{Frontend, MemoryOutcome, TurnStatus};
use serde::{Deserialize, Serialize};

/// Status chip shown under an assistant message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Badge {
    MemoriesFound { count: usize },
    MemorySaved,
    NotSaved,
    StoreFailed,
}

/// Outcome of a single browser request
#[derive(Debug, Clone, PartialEq)]
pub enum TurnView {
    Reply { reply: String, badges: Vec<Badge> },
    Failed(String),
    Empty,
}

/// Front end that answers exactly one queued message and records what happened
#[derive(Debug, Default)]
pub struct WebFrontend {
    pending: Option<String>,
    badges: Vec<Badge>,
    reply: Option<String>,
    error: Option<String>,
}

impl WebFrontend {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            pending: Some(input.into()),
            ..Self::default()
        }
    }

    pub fn into_view(self) -> TurnView {
        match (self.reply, self.error) {
            (_, Some(error)) => TurnView::Failed(error),
            (Some(reply), None) => TurnView::Reply {
                reply,
                badges: self.badges,
            },
            (None, None) => TurnView::Empty,
        }
    }
}

#[async_trait]
impl Frontend for WebFrontend {
    async fn next_input(&mut self) -> anyhow::Result<Option<String>> {
        Ok(self.pending.take())
    }

    fn render_status(&mut self, status: TurnStatus) {
        match status {
            TurnStatus::MemoriesFound(count) if count > 0 => {
                self.badges.push(Badge::MemoriesFound { count })
            }
            TurnStatus::Memory(MemoryOutcome::Saved) => self.badges.push(Badge::MemorySaved),
            TurnStatus::Memory(MemoryOutcome::StoreFailed) => self.badges.push(Badge::StoreFailed),
            TurnStatus::Memory(MemoryOutcome::Skipped | MemoryOutcome::Declined) => {
                self.badges.push(Badge::NotSaved)
            }
            _ => {}
        }
    }

    fn display_reply(&mut self, reply: &str) {
        self.reply = Some(reply.to_string());
    }

    fn display_error(&mut self, error: &CoreError) {
        self.error = Some(error.to_string());
    }
}
