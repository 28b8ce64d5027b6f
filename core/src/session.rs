use crate::history::RollingHistory;

/// How a finished exchange reaches the memory store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryPolicy {
    /// The relevance classifier decides
    Automatic,
    /// The front end asks the operator
    Manual,
    /// Nothing is stored
    Disabled,
}

/// Per-conversation state, owned by the front end for the lifetime of one session
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user_id: String,
    pub history: RollingHistory,
    pub memory_policy: MemoryPolicy,
}

impl SessionContext {
    pub fn new(user_id: impl Into<String>, memory_policy: MemoryPolicy) -> Self {
        Self {
            user_id: user_id.into(),
            history: RollingHistory::new(),
            memory_policy,
        }
    }

    /// Forgets the rolling history. Stored memories are untouched.
    pub fn reset(&mut self) {
        self.history.clear();
    }
}
