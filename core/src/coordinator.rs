use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use crate::classifier::is_worth_remembering;
use crate::client::ChatProvider;
use crate::errors::{CoreError, CoreResult};
use crate::memory::{search_memories, store_memory, MemoryProvider};
use crate::prompt::{build_messages, build_system_message};
use crate::session::{MemoryPolicy, SessionContext};
use crate::types::GenerationOptions;

/// Progress notifications emitted while a turn runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    EmptyInput,
    SearchingMemories,
    MemoriesFound(usize),
    GeneratingReply,
    Classifying,
    Storing,
    Memory(MemoryOutcome),
}

/// What happened to the exchange after the reply was shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryOutcome {
    Saved,
    StoreFailed,
    /// The classifier judged the exchange trivial
    Skipped,
    /// The operator answered no
    Declined,
    Disabled,
}

/// Result of one completed turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnSummary {
    pub reply: String,
    pub memories_found: usize,
    pub memory: MemoryOutcome,
}

/// Input/output strategy for a conversation front end
#[async_trait]
pub trait Frontend: Send {
    /// Next user message, or `None` to end the conversation.
    async fn next_input(&mut self) -> anyhow::Result<Option<String>>;

    fn render_status(&mut self, status: TurnStatus);

    fn display_reply(&mut self, reply: &str);

    fn display_error(&mut self, error: &CoreError);

    /// Operator decision for `MemoryPolicy::Manual`.
    async fn confirm_storage(&mut self, _input: &str, _reply: &str) -> bool {
        false
    }
}

/// Sequences search, prompt assembly, completion, classification and storage for each turn
#[derive(Clone)]
pub struct ConversationEngine {
    chat: Arc<dyn ChatProvider>,
    memory: Arc<dyn MemoryProvider>,
}

impl ConversationEngine {
    pub fn new(chat: Arc<dyn ChatProvider>, memory: Arc<dyn MemoryProvider>) -> Self {
        Self { chat, memory }
    }

    pub fn model_name(&self) -> &str {
        self.chat.model_name()
    }

    /// Runs one turn for `input`.
    ///
    /// Only a completion failure is returned as an error, and then `session` is left untouched.
    /// Search, classification and storage failures are absorbed.
    #[instrument(skip_all, fields(user_id = %session.user_id))]
    pub async fn process_turn(
        &self,
        session: &mut SessionContext,
        input: &str,
        frontend: &mut dyn Frontend,
    ) -> CoreResult<TurnSummary> {
        frontend.render_status(TurnStatus::SearchingMemories);
        let memories = search_memories(self.memory.as_ref(), input, &session.user_id).await;
        frontend.render_status(TurnStatus::MemoriesFound(memories.len()));

        let system = build_system_message(&memories);
        let messages = build_messages(system, &session.history, input);

        frontend.render_status(TurnStatus::GeneratingReply);
        let reply = match self.chat.complete(&messages, GenerationOptions::REPLY).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Failed to get response from chat provider");
                return Err(e);
            }
        };
        frontend.display_reply(&reply);

        let memory = self.remember(session, input, &reply, frontend).await;
        frontend.render_status(TurnStatus::Memory(memory));

        session.history.push_exchange(input, reply.clone());
        debug!(history_len = session.history.len(), "Turn complete");

        Ok(TurnSummary {
            reply,
            memories_found: memories.len(),
            memory,
        })
    }

    async fn remember(
        &self,
        session: &SessionContext,
        input: &str,
        reply: &str,
        frontend: &mut dyn Frontend,
    ) -> MemoryOutcome {
        let approved = match session.memory_policy {
            MemoryPolicy::Disabled => return MemoryOutcome::Disabled,
            MemoryPolicy::Automatic => {
                frontend.render_status(TurnStatus::Classifying);
                is_worth_remembering(self.chat.as_ref(), input, reply).await
            }
            MemoryPolicy::Manual => frontend.confirm_storage(input, reply).await,
        };

        if !approved {
            return match session.memory_policy {
                MemoryPolicy::Manual => MemoryOutcome::Declined,
                _ => MemoryOutcome::Skipped,
            };
        }

        frontend.render_status(TurnStatus::Storing);
        if store_memory(self.memory.as_ref(), input, reply, &session.user_id).await {
            MemoryOutcome::Saved
        } else {
            MemoryOutcome::StoreFailed
        }
    }

    /// Drives turns until the front end runs out of input. Returns the number of completed turns.
    pub async fn run_conversation(
        &self,
        session: &mut SessionContext,
        frontend: &mut dyn Frontend,
    ) -> anyhow::Result<usize> {
        let mut completed = 0;

        while let Some(input) = frontend.next_input().await? {
            let input = input.trim();
            if input.is_empty() {
                frontend.render_status(TurnStatus::EmptyInput);
                continue;
            }

            match self.process_turn(session, input, frontend).await {
                Ok(_) => completed += 1,
                Err(e) => frontend.display_error(&e),
            }
        }

        info!(completed, "Conversation ended");
        Ok(completed)
    }
}
