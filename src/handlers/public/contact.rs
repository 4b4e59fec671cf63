// handlers/public/contact.rs - POST /contact/appointment handler

use axum::extract::State;
use chrono::Utc;

use crate::database::dynamic::DynamicValue;
use crate::database::models::{appointment, Appointment, AppointmentRequest};
use crate::database::repository::Collection;
use crate::middleware::{ApiResponse, ApiResult, SecurityContext};
use crate::services::notify::{notify_in_background, Notification};
use crate::state::AppState;
use crate::types::Encodable;

/**
 * POST /contact/appointment - Book an appointment from the public site
 *
 * Decrypted input:
 * ```json
 * {
 *   "name": "string",            // Required
 *   "email": "string",           // Optional, receives the confirmation mail
 *   "phone": "string",           // Required, at least 10 digits
 *   "service": "string",
 *   "message": "string",
 *   "preferredDate": "YYYY-MM-DD",
 *   "preferredTime": "string"
 * }
 * ```
 *
 * The stored record starts out `pending`. The acknowledgement mail is sent in
 * the background and never delays or fails the response.
 */
pub async fn create_appointment(
    State(state): State<AppState>,
    context: SecurityContext,
) -> ApiResult<DynamicValue> {
    let request: AppointmentRequest = context.decode_body()?;
    request.validate(Utc::now().date_naive())?;

    let appointment = Appointment::from_request(request);
    Collection::<Appointment>::new(appointment::COLLECTION, state.repository.clone())
        .insert(&appointment)
        .await?;

    tracing::info!(
        appointment = %appointment.id,
        date = %appointment.preferred_date,
        "Appointment request stored"
    );

    notify_in_background(state.notifier.clone(), Notification::Received, appointment.clone());

    Ok(ApiResponse::success(appointment.encode()).with_message("Appointment request received"))
}
