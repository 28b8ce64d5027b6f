use std::error::Error;
use std::fmt::{Debug, Display};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memchat_core::types::Role;
use memchat_core::SessionContext;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::frontend::Badge;

/// Error type for session store operations
#[derive(Debug)]
pub enum SessionStoreError {
    /// Session not found or expired
    NotFound(String),
    /// Error occurred during a store operation
    StorageError(String),
}

impl Display for SessionStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStoreError::NotFound(id) => write!(f, "Session not found: {}", id),
            SessionStoreError::StorageError(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl Error for SessionStoreError {}

/// One rendered chat bubble
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayMessage {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub badges: Vec<Badge>,
}

/// State of a single browser conversation
#[derive(Debug)]
pub struct ChatSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub context: SessionContext,
    pub transcript: Vec<DisplayMessage>,
}

impl ChatSession {
    pub fn new(id: String, context: SessionContext) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            context,
            transcript: Vec::new(),
        }
    }

    /// Appends a completed exchange to the transcript.
    pub fn record_exchange(&mut self, input: &str, reply: &str, badges: Vec<Badge>) {
        self.transcript.push(DisplayMessage {
            role: Role::User,
            content: input.to_string(),
            badges: Vec::new(),
        });
        self.transcript.push(DisplayMessage {
            role: Role::Assistant,
            content: reply.to_string(),
            badges,
        });
    }

    /// Empties the transcript and the rolling history. Stored memories are untouched.
    pub fn clear(&mut self) {
        self.transcript.clear();
        self.context.reset();
    }
}

/// Shared handle; the mutex serialises turns within one session
pub type SessionHandle = Arc<Mutex<ChatSession>>;

/// Trait defining the interface for session stores
#[async_trait]
pub trait SessionStore: Send + Sync + Debug {
    /// Create a session around the given context and return its handle
    async fn create_session(&self, context: SessionContext) -> Result<SessionHandle, SessionStoreError>;

    /// Get a live session by ID, refreshing its idle timer
    async fn get_session(&self, id: &str) -> Result<SessionHandle, SessionStoreError>;

    /// Delete a session by ID
    async fn delete_session(&self, id: &str) -> Result<(), SessionStoreError>;

    /// Delete sessions idle for longer than the store's TTL
    async fn cleanup_expired_sessions(&self) -> Result<usize, SessionStoreError>;
}

/// Type alias for Arc-wrapped SessionStore trait objects
pub type SessionStoreRef = Arc<dyn SessionStore>;
