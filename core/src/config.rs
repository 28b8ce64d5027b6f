use crate::errors::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const APP_NAME: &str = "memchat";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_USER_ID: &str = "abdullah_01";
pub const DEFAULT_CHAT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MEMORY_BASE_URL: &str = "https://api.mem0.ai";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8501";
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 120;

/// Environment variables holding the chat provider key, first match wins
pub const CHAT_KEY_VARS: [&str; 2] = ["groq_api", "GROQ_API_KEY"];
/// Environment variables holding the memory provider key, first match wins
pub const MEMORY_KEY_VARS: [&str; 2] = ["mem0_api", "MEM0_API_KEY"];

/// Configuration file contents. Every key is optional.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub groq_api: Option<String>,
    pub mem0_api: Option<String>,
    pub model_name: Option<String>,
    pub user_id: Option<String>,
    pub chat_base_url: Option<String>,
    pub memory_base_url: Option<String>,
    pub auto_memory: Option<bool>,
    pub log_level: Option<String>,
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub web: WebConfig,
}

/// `[web]` table of the configuration file
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct WebConfig {
    pub bind_addr: Option<String>,
    pub session_ttl_minutes: Option<i64>,
}

impl AppConfig {
    /// Loads configuration from a file if it exists, otherwise returns the default config
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            CoreError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            CoreError::ConfigError(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Loads the explicit path if given, else the default location.
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => match get_default_config_file(APP_NAME) {
                Ok(path) => Self::load_from_file(&path),
                // No home directory: nothing to read, run on defaults and env
                Err(_) => Ok(Self::default()),
            },
        }
    }

    /// Merges this config with another config, preferring values from the other config if present
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            groq_api: other.groq_api.clone().or_else(|| self.groq_api.clone()),
            mem0_api: other.mem0_api.clone().or_else(|| self.mem0_api.clone()),
            model_name: other.model_name.clone().or_else(|| self.model_name.clone()),
            user_id: other.user_id.clone().or_else(|| self.user_id.clone()),
            chat_base_url: other
                .chat_base_url
                .clone()
                .or_else(|| self.chat_base_url.clone()),
            memory_base_url: other
                .memory_base_url
                .clone()
                .or_else(|| self.memory_base_url.clone()),
            auto_memory: other.auto_memory.or(self.auto_memory),
            log_level: other.log_level.clone().or_else(|| self.log_level.clone()),
            request_timeout_secs: other.request_timeout_secs.or(self.request_timeout_secs),
            web: WebConfig {
                bind_addr: other
                    .web
                    .bind_addr
                    .clone()
                    .or_else(|| self.web.bind_addr.clone()),
                session_ttl_minutes: other
                    .web
                    .session_ttl_minutes
                    .or(self.web.session_ttl_minutes),
            },
        }
    }

    pub fn model_name(&self) -> &str {
        self.model_name.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn user_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or(DEFAULT_USER_ID)
    }

    pub fn auto_memory(&self) -> bool {
        self.auto_memory.unwrap_or(true)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn memory_base_url(&self) -> &str {
        self.memory_base_url
            .as_deref()
            .unwrap_or(DEFAULT_MEMORY_BASE_URL)
    }

    pub fn bind_addr(&self) -> &str {
        self.web.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    }

    pub fn session_ttl_minutes(&self) -> i64 {
        self.web
            .session_ttl_minutes
            .unwrap_or(DEFAULT_SESSION_TTL_MINUTES)
    }

    /// Settings for the chat completion client
    pub fn chat_settings(&self) -> ChatSettings {
        ChatSettings {
            model_name: self.model_name().to_string(),
            base_url: self
                .chat_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_CHAT_BASE_URL.to_string()),
            timeout: self.request_timeout(),
        }
    }
}

/// Connection settings for the chat completion provider
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSettings {
    pub model_name: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ChatSettings {
    fn default() -> Self {
        AppConfig::default().chat_settings()
    }
}

/// The two provider secrets, read once at startup
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub chat_api_key: String,
    pub memory_api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("chat_api_key", &"<redacted>")
            .field("memory_api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Resolves credentials from `lookup` (the environment), falling back to the config file.
    pub fn resolve<F>(lookup: F, file: &AppConfig) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |vars: &[&str], fallback: &Option<String>| {
            vars.iter()
                .filter_map(|&name| lookup(name))
                .chain(fallback.iter().cloned())
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty())
        };

        let chat = pick(&CHAT_KEY_VARS, &file.groq_api);
        let memory = pick(&MEMORY_KEY_VARS, &file.mem0_api);

        match (chat, memory) {
            (Some(chat_api_key), Some(memory_api_key)) => Ok(Self {
                chat_api_key,
                memory_api_key,
            }),
            (chat, memory) => {
                let mut missing = Vec::new();
                if chat.is_none() {
                    missing.push(CHAT_KEY_VARS[0]);
                }
                if memory.is_none() {
                    missing.push(MEMORY_KEY_VARS[0]);
                }
                Err(CoreError::ConfigError(format!(
                    "Missing required API keys: {}",
                    missing.join(" or ")
                )))
            }
        }
    }
}

/// Loads `.env` if present, then resolves credentials from the process environment and `file`.
pub fn load_environment(file: &AppConfig) -> CoreResult<Credentials> {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => debug!("Ignoring unreadable .env file: {}", e),
    }
    Credentials::resolve(|name| std::env::var(name).ok(), file)
}

/// Helper function to get default config directory
pub fn get_default_config_dir(app_name: &str) -> CoreResult<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| {
        CoreError::ConfigError("Could not determine home directory".to_string())
    })?;

    Ok(home_dir.join(".config").join(app_name))
}

/// Helper function to get default config file path
pub fn get_default_config_file(app_name: &str) -> CoreResult<PathBuf> {
    let config_dir = get_default_config_dir(app_name)?;
    Ok(config_dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resolve_from_environment() {
        let vars = env(&[("groq_api", "gsk-1"), ("mem0_api", "m0-1")]);
        let creds = Credentials::resolve(|k| vars.get(k).cloned(), &AppConfig::default()).unwrap();
        assert_eq!(creds.chat_api_key, "gsk-1");
        assert_eq!(creds.memory_api_key, "m0-1");
    }

    #[test]
    fn test_resolve_accepts_uppercase_names() {
        let vars = env(&[("GROQ_API_KEY", "gsk-2"), ("MEM0_API_KEY", "m0-2")]);
        let creds = Credentials::resolve(|k| vars.get(k).cloned(), &AppConfig::default()).unwrap();
        assert_eq!(creds.chat_api_key, "gsk-2");
        assert_eq!(creds.memory_api_key, "m0-2");
    }

    #[test]
    fn test_resolve_falls_back_to_file() {
        let vars = env(&[("groq_api", "gsk-env")]);
        let file = AppConfig {
            groq_api: Some("gsk-file".to_string()),
            mem0_api: Some("m0-file".to_string()),
            ..Default::default()
        };
        let creds = Credentials::resolve(|k| vars.get(k).cloned(), &file).unwrap();
        assert_eq!(creds.chat_api_key, "gsk-env");
        assert_eq!(creds.memory_api_key, "m0-file");
    }

    #[test]
    fn test_missing_or_empty_keys_are_config_errors() {
        let vars = env(&[("groq_api", "   ")]);
        let err = Credentials::resolve(|k| vars.get(k).cloned(), &AppConfig::default()).unwrap_err();
        assert!(err.is_fatal());
        let message = err.to_string();
        assert!(message.contains("groq_api"));
        assert!(message.contains("mem0_api"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials {
            chat_api_key: "gsk-secret".to_string(),
            memory_api_key: "m0-secret".to_string(),
        };
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load_from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.model_name(), DEFAULT_MODEL);
        assert_eq!(config.user_id(), DEFAULT_USER_ID);
        assert!(config.auto_memory());
    }

    #[test]
    fn test_load_valid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            model_name = "llama-3.1-8b-instant"
            user_id = "casey"
            auto_memory = false
            request_timeout_secs = 5

            [web]
            bind_addr = "0.0.0.0:9000"
            "#,
        )
        .unwrap();

        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.model_name(), "llama-3.1-8b-instant");
        assert_eq!(config.user_id(), "casey");
        assert!(!config.auto_memory());
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.session_ttl_minutes(), DEFAULT_SESSION_TTL_MINUTES);
    }

    #[test]
    fn test_load_invalid_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "model_name = [not toml").unwrap();
        assert!(matches!(
            AppConfig::load_from_file(&path),
            Err(CoreError::ConfigError(_))
        ));
    }

    #[test]
    fn test_merge_prefers_other() {
        let base = AppConfig {
            model_name: Some("base-model".to_string()),
            user_id: Some("base-user".to_string()),
            ..Default::default()
        };
        let overrides = AppConfig {
            user_id: Some("cli-user".to_string()),
            ..Default::default()
        };
        let merged = base.merge(&overrides);
        assert_eq!(merged.model_name(), "base-model");
        assert_eq!(merged.user_id(), "cli-user");
    }
}
