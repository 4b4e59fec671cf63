use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_rate_limiting: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub max_request_size_bytes: usize,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicCredentials {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub require_https: bool,
    #[serde(skip_serializing)]
    pub encryption_key: Option<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
    pub jwt_expiry_hours: u64,
    pub basic_auth: Option<BasicCredentials>,
    pub admin_basic_auth: Option<BasicCredentials>,
    /// Static secret for `X-Admin-Token`; falls back to the encryption key
    #[serde(skip_serializing)]
    pub admin_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub sender_email: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        // API overrides
        if let Some(v) = non_empty("CLINIC_API_PORT").or_else(|| non_empty("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Some(v) = non_empty("RATE_LIMIT_ENABLED") {
            self.api.enable_rate_limiting = v.parse().unwrap_or(self.api.enable_rate_limiting);
        }
        if let Some(v) = non_empty("RATE_LIMIT_PER_IP") {
            self.api.rate_limit_requests = v.parse().unwrap_or(self.api.rate_limit_requests);
        }
        if let Some(v) = non_empty("RATE_LIMIT_WINDOW_SECS") {
            self.api.rate_limit_window_secs = v.parse().unwrap_or(self.api.rate_limit_window_secs);
        }
        if let Some(v) = non_empty("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Some(v) = non_empty("SECURITY_REQUIRE_HTTPS") {
            self.security.require_https = v.parse().unwrap_or(self.security.require_https);
        }
        if let Some(v) = non_empty("ENCRYPTION_KEY") {
            self.security.encryption_key = Some(v);
        }
        if let Some(v) = non_empty("JWT_SECRET") {
            self.security.jwt_secret = Some(v);
        }
        if let Some(v) = non_empty("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        let generic = match (non_empty("BASIC_AUTH_USERNAME"), non_empty("BASIC_AUTH_PASSWORD")) {
            (Some(user), Some(pass)) => Some(BasicCredentials::new(user, pass)),
            _ => None,
        };
        let admin = match (
            non_empty("ADMIN_BASIC_AUTH_USERNAME"),
            non_empty("ADMIN_BASIC_AUTH_PASSWORD"),
        ) {
            (Some(user), Some(pass)) => Some(BasicCredentials::new(user, pass)),
            _ => generic.clone(),
        };
        if generic.is_some() {
            self.security.basic_auth = generic;
        }
        if admin.is_some() {
            self.security.admin_basic_auth = admin;
        }

        self.security.admin_token = non_empty("ADMIN_TOKEN").or_else(|| self.security.encryption_key.clone());

        // Notification overrides
        if let Some(v) = non_empty("SMTP_USERNAME") {
            self.notify.sender_email = Some(v);
        }

        self
    }

    /// Secrets the server cannot start without
    pub fn validate(&self) -> Result<(), ConfigError> {
        let key = self
            .security
            .encryption_key
            .as_deref()
            .ok_or(ConfigError::Missing("ENCRYPTION_KEY"))?;
        if ![16, 24, 32].contains(&key.len()) {
            return Err(ConfigError::Invalid {
                name: "ENCRYPTION_KEY",
                reason: format!("expected 16, 24 or 32 bytes, got {}", key.len()),
            });
        }
        if self.security.jwt_secret.is_none() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if self.api.enable_rate_limiting && self.api.rate_limit_window_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "RATE_LIMIT_WINDOW_SECS",
                reason: "window must be at least one second".to_string(),
            });
        }
        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                port: 8080,
                enable_rate_limiting: true,
                rate_limit_requests: 100,
                rate_limit_window_secs: 15 * 60,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                require_https: false,
                encryption_key: None,
                jwt_secret: None,
                jwt_expiry_hours: 24 * 365,
                basic_auth: None,
                admin_basic_auth: None,
                admin_token: None,
            },
            notify: NotifyConfig { sender_email: None },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.api.max_request_size_bytes = 5 * 1024 * 1024; // 5MB
        config.security.require_https = true;
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.api.max_request_size_bytes = 2 * 1024 * 1024; // 2MB
        config.security.require_https = true;
        config
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
