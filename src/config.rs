//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `PORT` — HTTP port (default: 9000)
//! - `DEEPSEEK_API_KEY` — upstream credential (unset disables chat)
//! - `DEEPSEEK_API_URL` — chat-completions URL
//! - `DATABASE_URL` / `MONGODB_URI` — data store probed at startup
//! - `APP_ENV` / `NODE_ENV` — `development` exposes error details

use thiserror::Error;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 9000;

/// Default DeepSeek chat-completions endpoint.
pub const DEFAULT_DEEPSEEK_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `PORT` is set but is not a valid port number.
    #[error("Invalid PORT value '{0}'")]
    InvalidPort(String),
}

/// Runtime mode, controls how much error detail reaches callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    Development,
    #[default]
    Production,
}

impl RunMode {
    /// Parse a mode flag. Anything other than `development`/`dev` is production.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Self::Development,
            _ => Self::Production,
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the HTTP listener binds on `0.0.0.0`.
    pub port: u16,
    /// Upstream API key. `None` when unset or blank.
    pub deepseek_api_key: Option<String>,
    /// Upstream chat-completions URL.
    pub deepseek_api_url: String,
    /// Data store connection string, probed once at startup.
    pub database_url: Option<String>,
    /// Error-detail verbosity.
    pub run_mode: RunMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            deepseek_api_key: None,
            deepseek_api_url: DEFAULT_DEEPSEEK_API_URL.to_string(),
            database_url: None,
            run_mode: RunMode::default(),
        }
    }
}

impl AppConfig {
    /// Load from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            deepseek_api_key: get("DEEPSEEK_API_KEY"),
            deepseek_api_url: get("DEEPSEEK_API_URL")
                .unwrap_or_else(|| DEFAULT_DEEPSEEK_API_URL.into()),
            database_url: get("DATABASE_URL").or_else(|| get("MONGODB_URI")),
            run_mode: get("APP_ENV")
                .or_else(|| get("NODE_ENV"))
                .map(|v| RunMode::parse(&v))
                .unwrap_or_default(),
        })
    }

    /// Socket address string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 9000);
        assert!(config.deepseek_api_key.is_none());
        assert_eq!(config.deepseek_api_url, DEFAULT_DEEPSEEK_API_URL);
        assert!(config.database_url.is_none());
        assert_eq!(config.run_mode, RunMode::Production);
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn test_reads_all_variables() {
        let config = load(&[
            ("PORT", "8081"),
            ("DEEPSEEK_API_KEY", "sk-test"),
            ("DEEPSEEK_API_URL", "http://localhost:1234/v1/chat/completions"),
            ("DATABASE_URL", "postgres://db:5432/app"),
            ("APP_ENV", "development"),
        ])
        .unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.deepseek_api_key.as_deref(), Some("sk-test"));
        assert_eq!(
            config.deepseek_api_url,
            "http://localhost:1234/v1/chat/completions"
        );
        assert_eq!(config.database_url.as_deref(), Some("postgres://db:5432/app"));
        assert!(config.run_mode.is_development());
    }

    #[test]
    fn test_fallback_variable_names() {
        let config = load(&[
            ("MONGODB_URI", "mongodb://localhost:27017/myapp"),
            ("NODE_ENV", "development"),
        ])
        .unwrap();
        assert_eq!(
            config.database_url.as_deref(),
            Some("mongodb://localhost:27017/myapp")
        );
        assert_eq!(config.run_mode, RunMode::Development);
    }

    #[test]
    fn test_blank_api_key_is_unset() {
        let config = load(&[("DEEPSEEK_API_KEY", "   ")]).unwrap();
        assert!(config.deepseek_api_key.is_none());
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = load(&[("PORT", "not-a-port")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort(ref v) if v == "not-a-port"));
    }

    #[test]
    fn test_run_mode_parse() {
        assert_eq!(RunMode::parse("DEV"), RunMode::Development);
        assert_eq!(RunMode::parse("production"), RunMode::Production);
        assert_eq!(RunMode::parse("staging"), RunMode::Production);
    }
}
