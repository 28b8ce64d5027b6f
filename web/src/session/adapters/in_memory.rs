use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use memchat_core::SessionContext;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::session::store::{ChatSession, SessionHandle, SessionStore, SessionStoreError};

#[derive(Debug)]
struct Entry {
    handle: SessionHandle,
    last_seen: DateTime<Utc>,
}

/// In-memory implementation of SessionStore with an idle timeout
#[derive(Debug)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Entry>>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    fn is_expired(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        now - entry.last_seen > self.ttl
    }
}

fn lock_error(e: impl std::fmt::Display) -> SessionStoreError {
    SessionStoreError::StorageError(format!("Failed to acquire session lock: {}", e))
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(&self, context: SessionContext) -> Result<SessionHandle, SessionStoreError> {
        let id = Uuid::new_v4().to_string();
        let handle = Arc::new(Mutex::new(ChatSession::new(id.clone(), context)));

        let mut sessions = self.sessions.write().map_err(lock_error)?;
        sessions.insert(
            id.clone(),
            Entry {
                handle: handle.clone(),
                last_seen: Utc::now(),
            },
        );
        debug!("Created session: {}", id);

        Ok(handle)
    }

    async fn get_session(&self, id: &str) -> Result<SessionHandle, SessionStoreError> {
        let mut sessions = self.sessions.write().map_err(lock_error)?;
        let now = Utc::now();

        let expired = match sessions.get(id) {
            Some(entry) => self.is_expired(entry, now),
            None => return Err(SessionStoreError::NotFound(id.to_string())),
        };
        if expired {
            sessions.remove(id);
            debug!("Session expired on access: {}", id);
            return Err(SessionStoreError::NotFound(id.to_string()));
        }

        let entry = sessions
            .get_mut(id)
            .ok_or_else(|| SessionStoreError::NotFound(id.to_string()))?;
        entry.last_seen = now;
        Ok(entry.handle.clone())
    }

    async fn delete_session(&self, id: &str) -> Result<(), SessionStoreError> {
        let mut sessions = self.sessions.write().map_err(lock_error)?;
        if sessions.remove(id).is_none() {
            return Err(SessionStoreError::NotFound(id.to_string()));
        }

        debug!("Deleted session: {}", id);
        Ok(())
    }

    async fn cleanup_expired_sessions(&self) -> Result<usize, SessionStoreError> {
        let mut sessions = self.sessions.write().map_err(lock_error)?;
        let now = Utc::now();

        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_expired(entry, now));
        let count = before - sessions.len();

        if count > 0 {
            info!("Cleaned up {} expired sessions", count);
        }
        Ok(count)
    }
}
