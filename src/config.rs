//! Client configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

/// Default backend base URL (local Django dev server).
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

/// Path fragment that marks a request as targeting the board API.
pub const DEFAULT_API_PREFIX: &str = "/api/";

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL, without trailing slash (e.g. `http://host/api`)
    pub api_url: String,
    /// Requests whose URL contains this fragment get the auth header
    pub api_prefix: String,
    /// File backing the durable client storage
    pub storage_path: PathBuf,
    /// Log every outgoing request at debug level
    pub request_log: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let api_url = env::var("TASKBOARD_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_url = normalize_base_url(&api_url)?;

        let api_prefix =
            env::var("TASKBOARD_API_PREFIX").unwrap_or_else(|_| DEFAULT_API_PREFIX.to_string());
        if api_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "TASKBOARD_API_PREFIX",
                reason: "must not be empty".to_string(),
            });
        }

        let request_log = match env::var("TASKBOARD_REQUEST_LOG") {
            Ok(v) => parse_bool(&v).ok_or_else(|| ConfigError::Invalid {
                name: "TASKBOARD_REQUEST_LOG",
                reason: format!("expected a boolean, got {v:?}"),
            })?,
            Err(_) => false,
        };

        Ok(Self {
            api_url,
            api_prefix,
            storage_path: env::var("TASKBOARD_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".taskboard/storage.json")),
            request_log,
        })
    }

    /// Deterministic config for tests, pointed at the given backend.
    pub fn test_default() -> Self {
        Self {
            api_url: "http://127.0.0.1:9/api".to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            storage_path: PathBuf::from("target/test-storage.json"),
            request_log: false,
        }
    }

    /// Same config with a different backend base URL.
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    reqwest::Url::parse(trimmed).map_err(|e| ConfigError::Invalid {
        name: "TASKBOARD_API_URL",
        reason: e.to_string(),
    })?;
    Ok(trimmed.to_string())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("TASKBOARD_API_URL", "http://localhost:8000/api/");
        env::set_var("TASKBOARD_REQUEST_LOG", "yes");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.api_url, "http://localhost:8000/api");
        assert_eq!(config.api_prefix, DEFAULT_API_PREFIX);
        assert!(config.request_log);

        env::remove_var("TASKBOARD_API_URL");
        env::remove_var("TASKBOARD_REQUEST_LOG");
    }

    #[test]
    fn test_rejects_bad_url() {
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
