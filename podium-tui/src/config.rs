//! Configuration loading for the Podium dashboard.
//!
//! Connection and storage fields are required. The `auth`, `retry`, and
//! `reconnect` sections may be omitted and fall back to the documented
//! defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Path suffix of the realtime leaderboard stream below the realtime root.
pub const SSE_PATH: &str = "/api/sse/leaderboard";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TuiConfig {
    pub api_base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    pub request_timeout_ms: u64,
    pub refresh_interval_ms: u64,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    pub persistence_path: PathBuf,
    pub log_path: PathBuf,
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Sent as `Authorization: Bearer <token>` when present.
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThemeConfig {
    pub name: String,
}

/// Request-layer retry for transport failures.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    pub attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 1,
            delay_ms: 500,
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Fixed-interval reconnect policy of the push channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectConfig {
    pub delay_ms: u64,
    #[serde(default)]
    pub jitter_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay_ms: 3000,
            jitter_ms: 0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or PODIUM_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl TuiConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let mut config = Self::from_path(&path)?;
        config.apply_api_url_override(std::env::var("PODIUM_API_URL").ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: TuiConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Replace `api_base_url` with a non-empty override.
    pub fn apply_api_url_override(&mut self, url: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.api_base_url.trim();
        if base.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must start with http:// or https://".to_string(),
            });
        }
        if let Some(token) = &self.auth.token {
            if token.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "auth.token",
                    reason: "must not be empty when set".to_string(),
                });
            }
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "refresh_interval_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.retry.attempts > 5 {
            return Err(ConfigError::InvalidValue {
                field: "retry.attempts",
                reason: "must be <= 5".to_string(),
            });
        }
        if self.reconnect.delay_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reconnect.delay_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.reconnect.jitter_ms > self.reconnect.delay_ms {
            return Err(ConfigError::InvalidValue {
                field: "reconnect.jitter_ms",
                reason: "must be <= delay_ms".to_string(),
            });
        }
        if self.persistence_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "persistence_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.log_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "log_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.theme.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "theme.name",
                reason: "must not be empty".to_string(),
            });
        }
        if crate::theme::Theme::by_name(&self.theme.name).is_none() {
            return Err(ConfigError::InvalidValue {
                field: "theme.name",
                reason: "only 'podium' and 'mono' are supported".to_string(),
            });
        }
        Ok(())
    }

    /// REST root without a trailing slash.
    pub fn rest_root(&self) -> &str {
        self.api_base_url.trim().trim_end_matches('/')
    }

    /// Realtime root: the REST root with a trailing `/api` removed.
    pub fn realtime_root(&self) -> &str {
        let rest = self.rest_root();
        rest.strip_suffix("/api").unwrap_or(rest)
    }

    pub fn sse_url(&self) -> String {
        format!("{}{}", self.realtime_root(), SSE_PATH)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("PODIUM_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
