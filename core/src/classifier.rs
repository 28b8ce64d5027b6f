use tracing::{debug, warn};

use crate::client::ChatProvider;
use crate::types::{ChatMessage, GenerationOptions};

const RUBRIC: &str = "You are a memory-importance classifier. \
Given a user message and an assistant reply, decide whether the exchange \
contains information worth saving to long-term memory.\n\n\
Save-worthy examples: personal facts, preferences, project details, \
technical decisions, goals, feedback, or anything the user might want \
the assistant to remember later.\n\n\
NOT save-worthy: greetings (hi, hello, hey), small-talk (how are you), \
thanks/goodbye, trivial one-word responses, or purely generic Q&A \
with no personal context.\n\n\
Reply with EXACTLY one word: SAVE or SKIP";

const SAVE_TOKEN: &str = "SAVE";

/// True when the verdict mentions SAVE anywhere, ignoring case and surrounding noise.
pub fn verdict_is_save(verdict: &str) -> bool {
    verdict.trim().to_uppercase().contains(SAVE_TOKEN)
}

/// Asks the chat provider whether an exchange deserves long-term memory.
///
/// Any failure answers `true`: losing context is worse than keeping a trivial exchange.
pub async fn is_worth_remembering(provider: &dyn ChatProvider, input: &str, reply: &str) -> bool {
    let messages = [
        ChatMessage::system(RUBRIC),
        ChatMessage::user(format!("User: {}\nAssistant: {}", input, reply)),
    ];

    match provider.complete(&messages, GenerationOptions::VERDICT).await {
        Ok(verdict) => {
            let save = verdict_is_save(&verdict);
            debug!(verdict = verdict.trim(), save, "Memory classifier verdict");
            save
        }
        Err(e) => {
            warn!(error = %e, "Memory classifier failed, saving anyway");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{CoreError, CoreResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedProvider {
        answer: CoreResult<String>,
        seen: Mutex<Vec<(Vec<ChatMessage>, GenerationOptions)>>,
    }

    impl ScriptedProvider {
        fn answering(answer: CoreResult<String>) -> Self {
            Self {
                answer,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            options: GenerationOptions,
        ) -> CoreResult<String> {
            self.seen.lock().unwrap().push((messages.to_vec(), options));
            match &self.answer {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(CoreError::RequestError(e.to_string())),
            }
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    #[test]
    fn test_verdict_matching_is_tolerant() {
        assert!(verdict_is_save("SAVE"));
        assert!(verdict_is_save("  save.\n"));
        assert!(verdict_is_save("**Save**"));
        assert!(!verdict_is_save("SKIP"));
        assert!(!verdict_is_save(""));
    }

    #[tokio::test]
    async fn test_request_uses_rubric_and_verdict_sampling() {
        let provider = ScriptedProvider::answering(Ok("SKIP".to_string()));
        assert!(!is_worth_remembering(&provider, "Hello", "Hi! How can I help?").await);

        let seen = provider.seen.lock().unwrap();
        let (messages, options) = &seen[0];
        assert_eq!(*options, GenerationOptions::VERDICT);
        assert_eq!(messages[0], ChatMessage::system(RUBRIC));
        assert_eq!(
            messages[1].content,
            "User: Hello\nAssistant: Hi! How can I help?"
        );
    }

    #[tokio::test]
    async fn test_failure_fails_open() {
        let provider =
            ScriptedProvider::answering(Err(CoreError::RequestError("timeout".to_string())));
        assert!(is_worth_remembering(&provider, "I prefer dark mode", "Noted").await);
    }
}
