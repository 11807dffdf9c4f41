//! Configuration for reaching the hosted store
//!
//! Two values are mandatory: the project URL and the anonymous API key.
//! A missing or empty value is fatal at startup. The user's access token is
//! optional; without it every analysis fails as unauthenticated.

use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the hosted project URL
pub const ENV_URL: &str = "SUPABASE_URL";
/// Environment variable holding the anonymous API key
pub const ENV_ANON_KEY: &str = "SUPABASE_ANON_KEY";
/// Environment variable holding the signed-in user's access token
pub const ENV_ACCESS_TOKEN: &str = "SUPABASE_ACCESS_TOKEN";
/// Environment variable naming the local user for the SQLite backend
pub const ENV_LOCAL_USER: &str = "HOTELCHECK_USER";

/// Default transport timeout for hosted calls
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("{name} is not a valid URL: {reason}")]
    InvalidUrl { name: &'static str, reason: String },
}

/// Endpoint and credentials for the hosted store and auth service
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub url: Url,
    pub anon_key: String,
    pub access_token: Option<String>,
    pub timeout: Duration,
}

impl RemoteConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_url = non_empty(ENV_URL).ok_or(ConfigError::Missing(ENV_URL))?;
        let anon_key = non_empty(ENV_ANON_KEY)
            .ok_or(ConfigError::Missing(ENV_ANON_KEY))?;

        let url = Url::parse(raw_url.trim()).map_err(|e| ConfigError::InvalidUrl {
            name: ENV_URL,
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                name: ENV_URL,
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        Ok(Self {
            url,
            anon_key: anon_key.trim().to_string(),
            access_token: non_empty(ENV_ACCESS_TOKEN).map(|t| t.trim().to_string()),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL without a trailing slash
    pub fn base(&self) -> &str {
        self.url.as_str().trim_end_matches('/')
    }
}

/// Get the default database path (~/.local/share/hotelcheck/hotelcheck.db)
pub fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("hotelcheck").join("hotelcheck.db")
}
