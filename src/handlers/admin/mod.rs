// handlers/admin/mod.rs - Admin handlers
//
// Three groups share the /admin prefix:
// - login / register: advisory admin Basic → decrypt → encrypt-response
// - dashboard (/admin/appointments/*): advisory admin Basic → X-Admin-Token
//   → decrypt → encrypt-response
// - /admin/me: bearer token → encrypt-response

pub mod appointments;
pub mod auth;

pub use auth::{login, me, register};
