use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    /// Session id, rotated on every registration
    pub jti: String,
}

impl Claims {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>, session_id: impl Into<String>, lifetime: Duration) -> Self {
        let now = Utc::now();

        Self {
            user_id: user_id.into(),
            email: email.into(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            jti: session_id.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT secret is not configured")]
    MissingSecret,

    #[error("JWT generation error: {0}")]
    Generation(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Issues and verifies HS256 identity tokens
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("lifetime_secs", &self.lifetime.num_seconds())
            .finish()
    }
}

impl TokenService {
    pub fn new(secret: &str, lifetime: Duration) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        })
    }

    /// Build from `JWT_SECRET` / `JWT_EXPIRY_HOURS`
    pub fn from_config() -> Result<Self, TokenError> {
        let security = &config::config().security;
        let secret = security.jwt_secret.as_deref().ok_or(TokenError::MissingSecret)?;
        Self::new(secret, Duration::hours(security.jwt_expiry_hours as i64))
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime.num_seconds()
    }

    /// Issue a token; a fresh session id is generated when none is given
    pub fn issue(&self, subject_id: &str, email: &str, session_id: Option<&str>) -> Result<String, TokenError> {
        let session = session_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        self.issue_claims(&Claims::new(subject_id, email, session, self.lifetime))
    }

    pub fn issue_claims(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    /// Verify signature and expiry. No other claim is checked.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        })?;

        // jsonwebtoken accepts exp == now; tokens are dead from that second on
        if data.claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-signing-secret", Duration::days(365)).unwrap()
    }

    #[test]
    fn issued_token_verifies() {
        let token = service().issue("admin-1", "admin@clinic.test", Some("session-9")).unwrap();
        let claims = service().verify(&token).unwrap();
        assert_eq!(claims.user_id, "admin-1");
        assert_eq!(claims.email, "admin@clinic.test");
        assert_eq!(claims.jti, "session-9");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn missing_session_gets_a_fresh_one() {
        let token = service().issue("admin-1", "admin@clinic.test", None).unwrap();
        let claims = service().verify(&token).unwrap();
        assert!(Uuid::parse_str(&claims.jti).is_ok());
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: "admin-1".into(),
            email: "admin@clinic.test".into(),
            iat: now - 120,
            exp: now - 60,
            jti: "s".into(),
        };
        let token = service().issue_claims(&claims).unwrap();
        assert!(matches!(service().verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn token_expiring_now_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: "admin-1".into(),
            email: "admin@clinic.test".into(),
            iat: now - 10,
            exp: now,
            jti: "s".into(),
        };
        let token = service().issue_claims(&claims).unwrap();
        assert!(matches!(service().verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let other = TokenService::new("another-secret", Duration::hours(1)).unwrap();
        let token = other.issue("admin-1", "admin@clinic.test", None).unwrap();
        assert!(matches!(service().verify(&token), Err(TokenError::Invalid(_))));
        assert!(matches!(service().verify("not.a.token"), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn empty_secret_is_a_config_error() {
        assert!(matches!(
            TokenService::new("", Duration::hours(1)),
            Err(TokenError::MissingSecret)
        ));
    }
}
