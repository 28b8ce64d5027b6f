use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::*;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use memchat_core::errors::CoreError;
use memchat_core::{ConversationEngine, Frontend, MemoryOutcome, SessionContext, TurnStatus};
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, warn};

use crate::output::print_reply;

/// Terminal front end: reads stdin, shows spinners while providers work
pub struct TerminalFrontend {
    interactive: bool,
    pending: Option<String>,
    spinner: Option<ProgressBar>,
}

impl TerminalFrontend {
    /// Reads messages from stdin until `quit`, `exit` or end of input.
    pub fn interactive() -> Self {
        Self {
            interactive: true,
            pending: None,
            spinner: None,
        }
    }

    /// Answers exactly one message.
    pub fn single(prompt: String) -> Self {
        Self {
            interactive: false,
            pending: Some(prompt),
            spinner: None,
        }
    }

    fn start_spinner(&mut self, message: &'static str) {
        self.stop_spinner();
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(120));
        self.spinner = Some(spinner);
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        print!("\n👤 {}: ", "You".green().bold());
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        let read = io::stdin()
            .read_line(&mut input)
            .context("Failed to read input")?;
        if read == 0 {
            // End of input
            println!();
            return Ok(None);
        }
        Ok(Some(input))
    }
}

/// `exit` and `quit` end the interactive loop, in any case
pub fn is_exit_command(input: &str) -> bool {
    let input = input.trim();
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

pub fn memories_found_label(count: usize) -> String {
    if count == 1 {
        "1 memory found".to_string()
    } else {
        format!("{} memories found", count)
    }
}

#[async_trait]
impl Frontend for TerminalFrontend {
    async fn next_input(&mut self) -> Result<Option<String>> {
        if !self.interactive {
            return Ok(self.pending.take());
        }

        let Some(input) = self.read_line()? else {
            return Ok(None);
        };
        if is_exit_command(&input) {
            println!("\n👋 Goodbye! Your memories have been saved.");
            return Ok(None);
        }
        Ok(Some(input))
    }

    fn render_status(&mut self, status: TurnStatus) {
        match status {
            TurnStatus::EmptyInput => println!("{}", "⚠️  Please enter a message.".yellow()),
            TurnStatus::SearchingMemories => self.start_spinner("🔍 Searching memories..."),
            TurnStatus::MemoriesFound(count) => {
                self.stop_spinner();
                if count > 0 {
                    println!("🧠 {}", memories_found_label(count).dimmed());
                }
            }
            TurnStatus::GeneratingReply => self.start_spinner("🤖 Generating response..."),
            TurnStatus::Classifying => self.start_spinner("🧐 Deciding whether to remember this..."),
            TurnStatus::Storing => self.start_spinner("💾 Storing memory..."),
            TurnStatus::Memory(outcome) => {
                self.stop_spinner();
                match outcome {
                    MemoryOutcome::Saved => println!("{}", "💾 Memory stored successfully".green()),
                    MemoryOutcome::StoreFailed => {
                        println!("{}", "⚠️  Memory storage failed".yellow())
                    }
                    MemoryOutcome::Skipped => println!("{}", "⏭️  Trivial, not saved".dimmed()),
                    MemoryOutcome::Declined => println!("{}", "⏭️  Skipped memory storage".dimmed()),
                    MemoryOutcome::Disabled => {}
                }
            }
        }
    }

    fn display_reply(&mut self, reply: &str) {
        self.stop_spinner();
        print_reply(reply);
    }

    fn display_error(&mut self, error: &CoreError) {
        self.stop_spinner();
        eprintln!("{} {}", "❌ Error:".red().bold(), error);
    }

    async fn confirm_storage(&mut self, _input: &str, _reply: &str) -> bool {
        self.stop_spinner();
        println!();
        match Confirm::new()
            .with_prompt("💾 Store this exchange in memory for future reference?")
            .wait_for_newline(true)
            .interact()
        {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "Could not read storage confirmation, not storing");
                false
            }
        }
    }
}

/// Runs the conversation loop until the operator leaves.
///
/// A single-prompt run that produced no reply is an error so the process exits non-zero.
pub async fn run_chat(
    engine: &ConversationEngine,
    session: &mut SessionContext,
    frontend: &mut TerminalFrontend,
) -> Result<()> {
    let completed = engine.run_conversation(session, frontend).await?;
    debug!(completed, "Chat finished");

    if !frontend.interactive && completed == 0 {
        anyhow::bail!("No reply was produced for the prompt");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use memchat_core::errors::CoreResult;
    use memchat_core::types::{ChatMessage, GenerationOptions};
    use memchat_core::{ChatProvider, MemoryItem, MemoryPolicy, MemoryProvider};
    use std::sync::Arc;

    struct FixedChat(Option<&'static str>);

    #[async_trait]
    impl ChatProvider for FixedChat {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _options: GenerationOptions,
        ) -> CoreResult<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| CoreError::RequestError("connection refused".to_string()))
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    struct NoMemory;

    #[async_trait]
    impl MemoryProvider for NoMemory {
        async fn search(&self, _query: &str, _user_id: &str) -> anyhow::Result<Vec<MemoryItem>> {
            Ok(Vec::new())
        }

        async fn add(&self, _messages: &[ChatMessage], _user_id: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn engine(reply: Option<&'static str>) -> ConversationEngine {
        ConversationEngine::new(Arc::new(FixedChat(reply)), Arc::new(NoMemory))
    }

    #[tokio::test]
    async fn test_single_prompt_failure_is_an_error() {
        colored::control::set_override(false);
        let mut session = SessionContext::new("u1", MemoryPolicy::Disabled);
        let mut frontend = TerminalFrontend::single("hello".to_string());

        let err = run_chat(&engine(None), &mut session, &mut frontend).await.unwrap_err();
        assert!(err.to_string().contains("No reply"));
        assert!(session.history.is_empty());
    }

    #[tokio::test]
    async fn test_single_prompt_success() {
        colored::control::set_override(false);
        let mut session = SessionContext::new("u1", MemoryPolicy::Disabled);
        let mut frontend = TerminalFrontend::single("hello".to_string());

        run_chat(&engine(Some("Hi!")), &mut session, &mut frontend).await.unwrap();
        assert_eq!(session.history.len(), 2);
    }

    #[test]
    fn test_exit_commands() {
        assert!(is_exit_command("quit"));
        assert!(is_exit_command("  EXIT\n"));
        assert!(!is_exit_command("quitting time"));
        assert!(!is_exit_command(""));
    }

    #[test]
    fn test_memories_found_label() {
        assert_eq!(memories_found_label(1), "1 memory found");
        assert_eq!(memories_found_label(3), "3 memories found");
    }

    #[tokio::test]
    async fn test_single_prompt_yields_once() {
        let mut frontend = TerminalFrontend::single("hello".to_string());
        assert_eq!(frontend.next_input().await.unwrap().as_deref(), Some("hello"));
        assert_eq!(frontend.next_input().await.unwrap(), None);
    }
}
