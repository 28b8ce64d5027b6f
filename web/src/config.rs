use anyhow::{Context, Result};
use chrono::Duration;
use memchat_core::config::AppConfig;
use std::net::SocketAddr;

/// Settings the HTTP front end reads from the shared configuration
#[derive(Debug, Clone)]
pub struct WebSettings {
    pub bind_addr: SocketAddr,
    pub session_ttl: Duration,
    pub user_id: String,
    /// Initial state of the "Smart memory" toggle for new sessions
    pub auto_memory: bool,
}

impl WebSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let bind_addr = config
            .bind_addr()
            .parse()
            .with_context(|| format!("Invalid bind address: {}", config.bind_addr()))?;

        let minutes = config.session_ttl_minutes().max(1);
        let session_ttl = Duration::try_minutes(minutes)
            .with_context(|| format!("Session TTL out of range: {} minutes", minutes))?;

        Ok(Self {
            bind_addr,
            session_ttl,
            user_id: config.user_id().to_string(),
            auto_memory: config.auto_memory(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memchat_core::config::WebConfig;

    #[test]
    fn test_defaults() {
        let settings = WebSettings::from_config(&AppConfig::default()).unwrap();
        assert_eq!(settings.bind_addr.to_string(), "127.0.0.1:8501");
        assert_eq!(settings.session_ttl, Duration::minutes(120));
        assert_eq!(settings.user_id, "abdullah_01");
        assert!(settings.auto_memory);
    }

    #[test]
    fn test_invalid_bind_addr() {
        let config = AppConfig {
            web: WebConfig {
                bind_addr: Some("not an address".to_string()),
                ..WebConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(WebSettings::from_config(&config).is_err());
    }

    #[test]
    fn test_session_ttl_bounds() {
        let with_ttl = |minutes| AppConfig {
            web: WebConfig {
                session_ttl_minutes: Some(minutes),
                ..WebConfig::default()
            },
            ..AppConfig::default()
        };

        let err = WebSettings::from_config(&with_ttl(i64::MAX)).unwrap_err();
        assert!(err.to_string().contains("out of range"));

        let settings = WebSettings::from_config(&with_ttl(0)).unwrap();
        assert_eq!(settings.session_ttl, Duration::minutes(1));
    }
}
