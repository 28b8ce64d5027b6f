//! System prompt assembly.

use crate::history::RollingHistory;
use crate::types::ChatMessage;

/// Fixed persona every system message starts with
pub const PERSONA: &str = "You are a helpful and knowledgeable assistant. ";

const MEMORY_HEADER: &str = "Relevant context from previous interactions:";

/// Builds the system instruction from the persona and any retrieved memories, in order.
pub fn build_system_message(memories: &[String]) -> String {
    if memories.is_empty() {
        return PERSONA.to_string();
    }

    format!("{}\n{}\n{}", PERSONA, MEMORY_HEADER, memories.join("\n"))
}

/// Ordered request sequence: one system message, the rolling history, then the new user turn.
pub fn build_messages(system: String, history: &RollingHistory, input: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system));
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(input));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn test_no_memories_is_persona_only() {
        assert_eq!(build_system_message(&[]), PERSONA);
    }

    #[test]
    fn test_memories_listed_in_order_one_per_line() {
        let memories = vec![
            "User prefers dark mode".to_string(),
            "User is building a CLI".to_string(),
            "User prefers dark mode".to_string(),
        ];
        let system = build_system_message(&memories);

        assert!(system.starts_with(PERSONA));
        let lines: Vec<&str> = system.lines().collect();
        assert_eq!(
            lines[1..],
            [
                MEMORY_HEADER,
                "User prefers dark mode",
                "User is building a CLI",
                "User prefers dark mode"
            ]
        );
    }

    #[test]
    fn test_messages_wrap_history() {
        let mut history = RollingHistory::new();
        history.push_exchange("Hi", "Hello!");

        let messages = build_messages(PERSONA.to_string(), &history, "How are you?");
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(messages[3].content, "How are you?");
    }
}
