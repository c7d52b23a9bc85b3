//! # Client Configuration
//!
//! Environment-driven configuration for the backend connection.
//!
//! ## Environment Variables
//! - `APEX_API_URL` - backend base URL (default `http://localhost:4000`)
//! - `APEX_API_TOKEN` - bearer token, when the session is authenticated
//! - `APEX_API_TIMEOUT_SECS` - request timeout (default 30)

use serde::{Deserialize, Serialize};

/// Default backend base URL, matching the legacy front-ends.
pub const DEFAULT_API_URL: &str = "http://localhost:4000";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`crate::HttpClient`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL, stored without a trailing slash.
    pub base_url: String,

    /// Bearer token attached to every request when present.
    pub token: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Creates a config for a base URL, trimming any trailing slashes.
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: normalize_base_url(&base_url.into()),
            ..ClientConfig::default()
        }
    }

    /// Sets the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Builds a config from defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = ClientConfig::default();

        if let Ok(url) = std::env::var("APEX_API_URL") {
            config.base_url = normalize_base_url(&url);
        }
        if let Ok(token) = std::env::var("APEX_API_TOKEN") {
            if !token.trim().is_empty() {
                config.token = Some(token);
            }
        }
        if let Ok(timeout) = std::env::var("APEX_API_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.trim().parse::<u64>() {
                config.timeout_secs = secs;
            }
        }

        config
    }
}

fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_API_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:4000");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_trailing_slashes_trimmed() {
        let config = ClientConfig::new("https://pos.example.com///");
        assert_eq!(config.base_url, "https://pos.example.com");
    }

    #[test]
    fn test_empty_url_falls_back_to_default() {
        let config = ClientConfig::new("  ");
        assert_eq!(config.base_url, DEFAULT_API_URL);
    }
}
