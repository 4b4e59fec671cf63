//! Per-request security context.
//!
//! Inserted by the sanitation stage, filled in by the authentication and
//! decryption stages, and read by handlers. Every field is write-once: a
//! second write is a pipeline wiring bug and fails the request.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequestParts, Request},
    http::request::Parts,
};

use crate::auth::Claims;
use crate::database::dynamic::DynamicValue;
use crate::error::ApiError;
use crate::types::Decodable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicRole {
    Generic,
    Admin,
}

/// Who passed Basic authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicIdentity {
    pub username: String,
    pub role: BasicRole,
}

#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    decrypted_body: Option<Bytes>,
    is_admin: bool,
    identity: Option<Claims>,
    basic: Option<BasicIdentity>,
}

fn already_set(field: &str) -> ApiError {
    tracing::error!("Security context field '{}' written twice", field);
    ApiError::internal_server_error("An error occurred while processing your request")
}

impl SecurityContext {
    pub fn decrypted_body(&self) -> Option<&Bytes> {
        self.decrypted_body.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn identity(&self) -> Option<&Claims> {
        self.identity.as_ref()
    }

    pub fn basic(&self) -> Option<&BasicIdentity> {
        self.basic.as_ref()
    }

    pub fn set_decrypted_body(&mut self, body: Bytes) -> Result<(), ApiError> {
        if self.decrypted_body.is_some() {
            return Err(already_set("decrypted_body"));
        }
        self.decrypted_body = Some(body);
        Ok(())
    }

    pub fn mark_admin(&mut self) -> Result<(), ApiError> {
        if self.is_admin {
            return Err(already_set("is_admin"));
        }
        self.is_admin = true;
        Ok(())
    }

    pub fn set_identity(&mut self, claims: Claims) -> Result<(), ApiError> {
        if self.identity.is_some() {
            return Err(already_set("identity"));
        }
        self.identity = Some(claims);
        Ok(())
    }

    pub fn set_basic(&mut self, identity: BasicIdentity) -> Result<(), ApiError> {
        if self.basic.is_some() {
            return Err(already_set("basic"));
        }
        self.basic = Some(identity);
        Ok(())
    }

    /// Decrypted body parsed as JSON
    pub fn payload(&self) -> Result<DynamicValue, ApiError> {
        let body = self
            .decrypted_body
            .as_ref()
            .ok_or_else(|| ApiError::bad_request("Data should be encrypted"))?;
        Ok(DynamicValue::from_slice(body)?)
    }

    /// Decrypted body decoded into a DTO
    pub fn decode_body<T: Decodable>(&self) -> Result<T, ApiError> {
        T::decode(&self.payload()?)
    }
}

/// Apply `update` to the request's context, creating it when a stage runs
/// without the sanitation stage in front of it.
pub fn with_context<F>(request: &mut Request, update: F) -> Result<(), ApiError>
where
    F: FnOnce(&mut SecurityContext) -> Result<(), ApiError>,
{
    let extensions = request.extensions_mut();
    if extensions.get::<SecurityContext>().is_none() {
        extensions.insert(SecurityContext::default());
    }
    match extensions.get_mut::<SecurityContext>() {
        Some(context) => update(context),
        None => Err(ApiError::internal_server_error("Security context unavailable")),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SecurityContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<SecurityContext>().cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn fields_are_write_once() {
        let mut context = SecurityContext::default();
        context.set_decrypted_body(Bytes::from_static(b"{}")).unwrap();
        assert!(context.set_decrypted_body(Bytes::from_static(b"[]")).is_err());
        assert_eq!(context.decrypted_body().unwrap().as_ref(), b"{}");

        context.mark_admin().unwrap();
        assert!(context.mark_admin().is_err());
        assert!(context.is_admin());
    }

    #[test]
    fn missing_body_means_unencrypted_request() {
        let err = SecurityContext::default().payload().unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Data should be encrypted");
    }

    #[test]
    fn malformed_body_is_rejected() {
        let mut context = SecurityContext::default();
        context.set_decrypted_body(Bytes::from_static(b"{oops")).unwrap();
        assert!(matches!(context.payload(), Err(ApiError::MalformedPayload(_))));
    }

    #[test]
    fn with_context_creates_and_updates() {
        let mut request = Request::new(Body::empty());
        with_context(&mut request, |ctx| {
            ctx.set_basic(BasicIdentity {
                username: "desk".into(),
                role: BasicRole::Generic,
            })
        })
        .unwrap();
        with_context(&mut request, |ctx| ctx.mark_admin()).unwrap();

        let context = request.extensions().get::<SecurityContext>().unwrap();
        assert_eq!(context.basic().unwrap().role, BasicRole::Generic);
        assert!(context.is_admin());
    }
}
