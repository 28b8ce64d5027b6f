// The memchat-memory crate talks to the hosted memory provider (Mem0).
// It searches and stores memories scoped to a user identity.

pub mod client;
pub mod config;
pub mod errors;
mod types;

pub use client::Mem0Client;
pub use config::MemorySettings;
pub use errors::{MemoryResult, MemoryStoreError};
