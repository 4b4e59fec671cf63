use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenService;
use crate::config::{AppConfig, BasicCredentials, ConfigError};
use crate::crypto::PayloadCipher;
use crate::database::repository::{MemoryRepository, Repository};
use crate::middleware::encrypt::EncryptionPolicy;
use crate::middleware::rate_limit::RateLimitPolicy;
use crate::rate_limit::RateLimitStore;
use crate::services::notify::{LogNotifier, Notifier};

pub const DEFAULT_REALM: &str = "Appointment Booking";

/// Credentials and switches read by the security stages
#[derive(Debug, Clone)]
pub struct SecuritySettings {
    pub basic: Option<BasicCredentials>,
    pub admin_basic: Option<BasicCredentials>,
    pub admin_token: Option<String>,
    pub require_https: bool,
    pub realm: String,
    pub max_body_bytes: usize,
    /// bcrypt work factor for admin passwords
    pub password_cost: u32,
}

/// Shared router state. Everything mutable lives behind its own `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub cipher: Arc<PayloadCipher>,
    pub tokens: Arc<TokenService>,
    pub rate_limits: Arc<RateLimitStore>,
    pub rate_limit: RateLimitPolicy,
    pub security: Arc<SecuritySettings>,
    pub encryption: EncryptionPolicy,
    pub repository: Arc<dyn Repository>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// Build from configuration with the in-memory store and log notifier
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let key = config
            .security
            .encryption_key
            .as_deref()
            .ok_or(ConfigError::Missing("ENCRYPTION_KEY"))?;
        let cipher = PayloadCipher::new(key).map_err(|e| ConfigError::Invalid {
            name: "ENCRYPTION_KEY",
            reason: e.to_string(),
        })?;

        let secret = config
            .security
            .jwt_secret
            .as_deref()
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let tokens = TokenService::new(secret, chrono::Duration::hours(config.security.jwt_expiry_hours as i64))
            .map_err(|e| ConfigError::Invalid {
                name: "JWT_SECRET",
                reason: e.to_string(),
            })?;

        Ok(Self {
            cipher: Arc::new(cipher),
            tokens: Arc::new(tokens),
            rate_limits: Arc::new(RateLimitStore::new()),
            rate_limit: RateLimitPolicy {
                enabled: config.api.enable_rate_limiting,
                limit: config.api.rate_limit_requests,
                window: Duration::from_secs(config.api.rate_limit_window_secs),
            },
            security: Arc::new(SecuritySettings {
                basic: config.security.basic_auth.clone(),
                admin_basic: config.security.admin_basic_auth.clone(),
                admin_token: config.security.admin_token.clone(),
                require_https: config.security.require_https,
                realm: DEFAULT_REALM.to_string(),
                max_body_bytes: config.api.max_request_size_bytes,
                password_cost: bcrypt::DEFAULT_COST,
            }),
            encryption: EncryptionPolicy::default(),
            repository: Arc::new(MemoryRepository::new()),
            notifier: Arc::new(LogNotifier::new(config.notify.sender_email.clone())),
        })
    }

    pub fn with_repository(mut self, repository: Arc<dyn Repository>) -> Self {
        self.repository = repository;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_security(mut self, security: SecuritySettings) -> Self {
        self.security = Arc::new(security);
        self
    }

    pub fn with_encryption_policy(mut self, policy: EncryptionPolicy) -> Self {
        self.encryption = policy;
        self
    }
}
