use std::collections::VecDeque;

use crate::types::ChatMessage;

/// Entries kept for context: the last 10 exchanges
pub const MAX_HISTORY_ENTRIES: usize = 20;

/// Bounded user/assistant history, oldest entries dropped first
#[derive(Debug, Clone, PartialEq)]
pub struct RollingHistory {
    entries: VecDeque<ChatMessage>,
    limit: usize,
}

impl Default for RollingHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl RollingHistory {
    pub fn new() -> Self {
        Self::with_limit(MAX_HISTORY_ENTRIES)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit + 2),
            limit,
        }
    }

    /// Appends a completed exchange and trims to the limit.
    pub fn push_exchange(&mut self, input: impl Into<String>, reply: impl Into<String>) {
        self.entries.push_back(ChatMessage::user(input));
        self.entries.push_back(ChatMessage::assistant(reply));
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn to_vec(&self) -> Vec<ChatMessage> {
        self.entries.iter().cloned().collect()
    }
}
