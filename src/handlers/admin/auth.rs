// handlers/admin/auth.rs - Admin registration, login and identity handlers

use axum::extract::State;
use bson::doc;

use crate::database::dynamic::DynamicValue;
use crate::database::models::{admin_user, AdminUser};
use crate::database::repository::Collection;
use crate::error::ApiError;
use crate::middleware::basic_auth::credentials_match;
use crate::middleware::{ApiResponse, ApiResult, BasicRole, SecurityContext};
use crate::state::AppState;
use crate::types::{required_text, text_field, Decodable};

/// Subject used in tokens issued to the configured admin pair
const CONFIGURED_ADMIN_SUBJECT: &str = "admin";

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub name: String,
    pub username: String,
    pub password: String,
}

impl Decodable for RegisterRequest {
    fn decode(value: &DynamicValue) -> Result<Self, ApiError> {
        Ok(Self {
            name: text_field(value, "name"),
            username: text_field(value, "username"),
            password: text_field(value, "password"),
        })
    }
}

fn check_length(value: &str, min: usize, max: usize, field: &str) -> Result<(), ApiError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ApiError::validation_failed(format!(
            "{} must be between {} and {} characters",
            field, min, max
        )));
    }
    Ok(())
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        check_length(&self.name, 2, 100, "Name")?;
        check_length(&self.username, 3, 50, "Username")?;
        check_length(&self.password, 6, 100, "Password")
    }
}

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl Decodable for LoginRequest {
    fn decode(value: &DynamicValue) -> Result<Self, ApiError> {
        Ok(Self {
            username: required_text(value, "username", "Username is required")?,
            password: required_text(value, "password", "Password is required")?,
        })
    }
}

fn admins(state: &AppState) -> Collection<AdminUser> {
    Collection::new(admin_user::COLLECTION, state.repository.clone())
}

fn token_payload(state: &AppState, token: String) -> DynamicValue {
    DynamicValue::map()
        .with("accessToken", token)
        .with("tokenType", "Bearer")
        .with("expiresIn", state.tokens.lifetime_secs())
}

async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| {
            tracing::error!("Password hashing task failed: {}", e);
            ApiError::internal_server_error("An error occurred while processing your request")
        })?
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            ApiError::internal_server_error("An error occurred while processing your request")
        })
}

async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    let result = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| {
            tracing::error!("Password verification task failed: {}", e);
            ApiError::internal_server_error("An error occurred while processing your request")
        })?;

    match result {
        Ok(valid) => Ok(valid),
        Err(e) => {
            tracing::warn!("Stored password hash is unreadable: {}", e);
            Ok(false)
        }
    }
}

/**
 * POST /admin/register - Create an admin account and sign it in
 *
 * Decrypted input: `{ "name": "string", "username": "string", "password": "string" }`
 *
 * Output data: the account (without credentials) plus `accessToken`,
 * `tokenType` and `expiresIn`.
 */
pub async fn register(State(state): State<AppState>, context: SecurityContext) -> ApiResult<DynamicValue> {
    let request: RegisterRequest = context.decode_body()?;
    request.validate()?;

    let admins = admins(&state);
    if admins
        .select_one(doc! { "username": request.username.as_str() })
        .await?
        .is_some()
    {
        return Err(ApiError::conflict("Username already exists"));
    }

    let password_hash = hash_password(request.password, state.security.password_cost).await?;
    let user = AdminUser::new(request.name, request.username, password_hash);
    admins.insert(&user).await?;
    tracing::info!(username = %user.username, "Admin registered");

    let token = state.tokens.issue(&user.id, &user.username, Some(&user.session_id))?;
    let mut body = user.public_view()?;
    body.merge(&token_payload(&state, token));

    Ok(ApiResponse::created(body).with_message("Admin registered successfully"))
}

/**
 * POST /admin/login - Exchange admin credentials for a bearer token
 *
 * Requests that already passed admin Basic authentication get a token
 * straight away. Otherwise the decrypted body must carry
 * `{ "username": "string", "password": "string" }`, checked against the
 * configured admin pair first and registered admins second.
 *
 * Output data: `accessToken`, `tokenType`, `expiresIn`, and `adminToken`,
 * the shared secret the dashboard routes expect in `X-Admin-Token`.
 */
pub async fn login(State(state): State<AppState>, context: SecurityContext) -> ApiResult<DynamicValue> {
    let (subject, email, session) = match context.basic() {
        Some(identity) if identity.role == BasicRole::Admin => {
            (CONFIGURED_ADMIN_SUBJECT.to_string(), identity.username.clone(), None)
        }
        _ => authenticate(&state, &context).await?,
    };

    let token = state.tokens.issue(&subject, &email, session.as_deref())?;
    tracing::info!(subject = %subject, "Admin login succeeded");

    let body = token_payload(&state, token).with("adminToken", state.security.admin_token.clone());
    Ok(ApiResponse::success(body).with_message("Login successful"))
}

async fn authenticate(
    state: &AppState,
    context: &SecurityContext,
) -> Result<(String, String, Option<String>), ApiError> {
    let request: LoginRequest = context.decode_body()?;

    if let Some(expected) = state.security.admin_basic.as_ref() {
        if credentials_match(expected, &request.username, &request.password) {
            return Ok((CONFIGURED_ADMIN_SUBJECT.to_string(), request.username, None));
        }
    }

    let user = admins(state)
        .select_one(doc! { "username": request.username.as_str() })
        .await?;
    if let Some(user) = user {
        if verify_password(request.password, user.password_hash.clone()).await? {
            return Ok((user.id, user.username, Some(user.session_id)));
        }
    }

    tracing::warn!(username = %request.username, "Admin login failed");
    Err(ApiError::unauthorized("Invalid credentials"))
}

/// GET /admin/me - The identity carried by the bearer token
pub async fn me(context: SecurityContext) -> ApiResult<DynamicValue> {
    let claims = context
        .identity()
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    Ok(ApiResponse::success(
        DynamicValue::map()
            .with("userId", claims.user_id.as_str())
            .with("email", claims.email.as_str())
            .with("sessionId", claims.jti.as_str())
            .with("issuedAt", claims.iat)
            .with("expiresAt", claims.exp),
    ))
}
