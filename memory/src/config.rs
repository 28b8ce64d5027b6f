use memchat_core::config::{AppConfig, DEFAULT_MEMORY_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use std::time::Duration;

/// Connection settings for the memory provider
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySettings {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MEMORY_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl From<&AppConfig> for MemorySettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.memory_base_url().to_string(),
            timeout: config.request_timeout(),
        }
    }
}
