pub mod admin_token;
pub mod basic_auth;
pub mod bearer;
pub mod context;
pub mod decrypt;
pub mod encrypt;
pub mod normalize;
pub mod rate_limit;
pub mod response;
pub mod security;

pub use admin_token::require_admin_token;
pub use basic_auth::{advisory_admin_basic, require_generic_basic};
pub use bearer::bearer_auth;
pub use context::{BasicIdentity, BasicRole, SecurityContext};
pub use decrypt::decrypt_payload;
pub use encrypt::{encrypt_response, EncryptionPolicy};
pub use normalize::{normalize_errors, panic_response};
pub use rate_limit::{enforce_rate_limit, RateLimitPolicy};
pub use response::{ApiResponse, ApiResult};
pub use security::sanitize_request;
