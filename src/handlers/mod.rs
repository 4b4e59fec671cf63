// handlers/mod.rs - Handlers grouped by the security stages in front of them
//
// health  → no authentication (sanitation and rate limiting only)
// public  → generic Basic credentials
// admin   → admin Basic, static admin token or bearer token

pub mod admin;
pub mod health;
pub mod public;
