// app.rs - Router assembly
//
// Global stages, outermost first:
//   trace → cors → sanitize → normalize-errors → rate-limit → catch-panic
// Each route group then adds its own authentication and encryption stages.
// With `route_layer` the last layer added runs first.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{admin, health, public};
use crate::middleware::{
    advisory_admin_basic, bearer_auth, decrypt_payload, encrypt_response, enforce_rate_limit,
    normalize_errors, panic_response, require_admin_token, require_generic_basic, sanitize_request,
};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public, no authentication
        .route("/health", get(health::health))
        // Route groups
        .merge(public_routes(state.clone()))
        .merge(admin_auth_routes(state.clone()))
        .merge(admin_routes(state.clone()))
        .merge(identity_routes(state.clone()))
        .fallback(health::not_found)
        // Global middleware
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(from_fn_with_state(state.clone(), enforce_rate_limit))
        .layer(from_fn(normalize_errors))
        .layer(from_fn_with_state(state.clone(), sanitize_request))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// basic (required) → decrypt → handler → encrypt
fn public_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/contact/appointment", post(public::create_appointment))
        .route_layer(from_fn_with_state(state.clone(), encrypt_response))
        .route_layer(from_fn_with_state(state.clone(), decrypt_payload))
        .route_layer(from_fn_with_state(state, require_generic_basic))
}

/// basic (advisory) → decrypt → handler → encrypt
fn admin_auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/register", post(admin::register))
        .route("/admin/login", post(admin::login))
        .route_layer(from_fn_with_state(state.clone(), encrypt_response))
        .route_layer(from_fn_with_state(state.clone(), decrypt_payload))
        .route_layer(from_fn_with_state(state, advisory_admin_basic))
}

/// basic (advisory) → admin token → decrypt → handler → encrypt
fn admin_routes(state: AppState) -> Router<AppState> {
    use admin::appointments;

    Router::new()
        .route("/admin/appointments/list", get(appointments::list))
        .route("/admin/appointments/calendar-summary", get(appointments::calendar_summary))
        .route("/admin/appointments/status", post(appointments::update_status))
        .route("/admin/appointments/reschedule", post(appointments::reschedule))
        .route("/admin/appointments/date-appointments", get(appointments::date_appointments))
        .route_layer(from_fn_with_state(state.clone(), encrypt_response))
        .route_layer(from_fn_with_state(state.clone(), decrypt_payload))
        .route_layer(from_fn_with_state(state.clone(), require_admin_token))
        .route_layer(from_fn_with_state(state, advisory_admin_basic))
}

/// bearer → handler → encrypt
fn identity_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/me", get(admin::me))
        .route_layer(from_fn_with_state(state.clone(), encrypt_response))
        .route_layer(from_fn_with_state(state, bearer_auth))
}
