//! Browser chat sessions
//!
//! Each browser tab owns one `ChatSession`: the core `SessionContext` plus the transcript the
//! page renders. Sessions live behind the `SessionStore` trait so the HTTP layer does not care
//! where they are kept.

pub mod adapters;
pub mod store;

pub use adapters::InMemorySessionStore;
pub use store::{ChatSession, DisplayMessage, SessionHandle, SessionStore, SessionStoreError, SessionStoreRef};
