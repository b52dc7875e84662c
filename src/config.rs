//! Client configuration

use crate::error::{ClientError, Result};
use crate::types::AuthMode;
use std::time::Duration;

/// Default refresh endpoint, relative to the base URL
pub const DEFAULT_REFRESH_PATH: &str = "/api/auth/refresh-token/";
/// Where the UI is sent when the session cannot be recovered
pub const DEFAULT_LOGIN_PATH: &str = "/auth/login/";
/// Where the UI is sent after an explicit logout
pub const DEFAULT_LOGOUT_PATH: &str = "/";
/// Default lifetime of a notification
pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_millis(5000);

/// Configuration for the API client and the application context
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin (and optional base path) every endpoint is appended to,
    /// e.g. "https://investafrik.example"
    pub base_url: String,

    /// Which authentication model the backend uses
    /// Default: bearer
    pub auth_mode: AuthMode,

    /// Refresh endpoint path
    pub refresh_path: String,

    /// Navigation target after a failed refresh
    pub login_path: String,

    /// Navigation target after logout
    pub logout_path: String,

    /// Per-request timeout. `None` leaves it to the transport default.
    pub timeout: Option<Duration>,

    /// Lifetime of a notification when none is given
    pub default_notification_duration: Duration,

    /// Cap on simultaneously visible notifications. `None` means uncapped.
    pub max_notifications: Option<usize>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            auth_mode: AuthMode::default(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            logout_path: DEFAULT_LOGOUT_PATH.to_string(),
            timeout: None,
            default_notification_duration: DEFAULT_NOTIFICATION_DURATION,
            max_notifications: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_auth_mode(mut self, auth_mode: AuthMode) -> Self {
        self.auth_mode = auth_mode;
        self
    }

    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_notifications(mut self, max: usize) -> Self {
        self.max_notifications = Some(max);
        self
    }

    /// Build a config from `INVESTAFRIK_*` environment variables, falling back
    /// to defaults for anything unset
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(base_url) = lookup("INVESTAFRIK_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(mode) = lookup("INVESTAFRIK_AUTH_MODE") {
            config.auth_mode = mode.parse().map_err(ClientError::Configuration)?;
        }
        if let Some(path) = lookup("INVESTAFRIK_REFRESH_PATH") {
            config.refresh_path = path;
        }
        if let Some(path) = lookup("INVESTAFRIK_LOGIN_PATH") {
            config.login_path = path;
        }
        if let Some(secs) = lookup("INVESTAFRIK_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|e| {
                ClientError::Configuration(format!("INVESTAFRIK_TIMEOUT_SECS `{secs}`: {e}"))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        if let Some(max) = lookup("INVESTAFRIK_MAX_NOTIFICATIONS") {
            let max: usize = max.trim().parse().map_err(|e| {
                ClientError::Configuration(format!("INVESTAFRIK_MAX_NOTIFICATIONS `{max}`: {e}"))
            })?;
            config.max_notifications = Some(max);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the base URL is absolute http(s)
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ClientError::Configuration(format!(
                "base_url must be an http(s) URL, got `{}`",
                self.base_url
            )));
        }
        if !self.refresh_path.starts_with('/') {
            return Err(ClientError::Configuration(format!(
                "refresh_path must start with `/`, got `{}`",
                self.refresh_path
            )));
        }
        Ok(())
    }

    /// Join the base URL and an endpoint path
    pub fn url_for(&self, endpoint: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if endpoint.starts_with('/') {
            format!("{base}{endpoint}")
        } else {
            format!("{base}/{endpoint}")
        }
    }
}
