// handlers/admin/appointments.rs - Admin dashboard appointment handlers
//
// Every request arrives with a decrypted payload, GET included (the `data`
// query parameter), so filters and paging travel encrypted too.

use std::collections::BTreeMap;

use axum::extract::State;
use bson::doc;
use chrono::Utc;

use crate::database::dynamic::DynamicValue;
use crate::database::models::appointment::{self, parse_date, DATE_FORMAT};
use crate::database::models::{Appointment, AppointmentStatus};
use crate::database::repository::{Collection, FindOptions};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, SecurityContext};
use crate::services::notify::{notify_in_background, Notification};
use crate::state::AppState;
use crate::types::{required_text, Decodable, Encodable};

const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 100;
const NOT_FOUND: &str = "Appointment not found";

fn appointments(state: &AppState) -> Collection<Appointment> {
    Collection::new(appointment::COLLECTION, state.repository.clone())
}

fn encode_all(items: &[Appointment]) -> DynamicValue {
    DynamicValue::Array(items.iter().map(Encodable::encode).collect())
}

#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub appointment_id: String,
    pub status: AppointmentStatus,
}

impl Decodable for StatusUpdate {
    fn decode(value: &DynamicValue) -> Result<Self, ApiError> {
        Ok(Self {
            appointment_id: required_text(value, "appointmentId", "Appointment id is required")?,
            status: required_text(value, "status", "Status is required")?.parse()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Reschedule {
    pub appointment_id: String,
    pub new_date: String,
    pub new_time: String,
}

impl Decodable for Reschedule {
    fn decode(value: &DynamicValue) -> Result<Self, ApiError> {
        Ok(Self {
            appointment_id: required_text(value, "appointmentId", "Appointment id is required")?,
            new_date: required_text(value, "newDate", "New date is required")?,
            new_time: required_text(value, "newTime", "New time is required")?,
        })
    }
}

/// GET /admin/appointments/list - Newest first, `{page?, perPage?}`
pub async fn list(State(state): State<AppState>, context: SecurityContext) -> ApiResult<DynamicValue> {
    let payload = context.payload()?;

    let page = match payload["page"].int_value() {
        p if p < 1 => 1,
        p => p,
    };
    let per_page = match payload["perPage"].int_value() {
        n if n < 1 => DEFAULT_PER_PAGE,
        n => n.min(MAX_PER_PAGE),
    };

    let skip = (page - 1)
        .checked_mul(per_page)
        .ok_or_else(|| ApiError::validation_failed("Page is out of range"))?;

    // fetch one extra row to learn whether another page exists
    let options = FindOptions::sorted(doc! { "createdAt": -1 }).page(skip as u64, (per_page + 1) as u64);
    let mut items = appointments(&state).select_any(doc! {}, options).await?;

    let has_more = items.len() as i64 > per_page;
    items.truncate(per_page as usize);

    Ok(ApiResponse::success(
        DynamicValue::map()
            .with("items", encode_all(&items))
            .with("page", page)
            .with("perPage", per_page)
            .with("hasMore", has_more),
    ))
}

/// GET /admin/appointments/calendar-summary - Appointment count per date
pub async fn calendar_summary(State(state): State<AppState>, context: SecurityContext) -> ApiResult<DynamicValue> {
    // the payload carries no filters, but an unencrypted request must still fail
    context.payload()?;

    let all = appointments(&state).select_any(doc! {}, FindOptions::default()).await?;

    let mut counts: BTreeMap<String, i64> = BTreeMap::new();
    for item in &all {
        *counts.entry(item.preferred_date.clone()).or_insert(0) += 1;
    }

    Ok(ApiResponse::success(DynamicValue::from(counts)))
}

/// POST /admin/appointments/status - `{appointmentId, status}`
pub async fn update_status(State(state): State<AppState>, context: SecurityContext) -> ApiResult<DynamicValue> {
    let update: StatusUpdate = context.decode_body()?;

    let collection = appointments(&state);
    let filter = doc! { "_id": update.appointment_id.as_str() };
    let mut record = collection.select_404(filter.clone(), NOT_FOUND).await?;

    record.status = update.status;
    record.touch();
    collection.replace(filter, &record, NOT_FOUND).await?;

    tracing::info!(appointment = %record.id, status = %record.status, "Appointment status updated");

    if record.status == AppointmentStatus::Confirmed {
        notify_in_background(state.notifier.clone(), Notification::Confirmed, record.clone());
    }

    Ok(ApiResponse::success(record.encode()).with_message("Appointment status updated"))
}

/// POST /admin/appointments/reschedule - `{appointmentId, newDate, newTime}`
pub async fn reschedule(State(state): State<AppState>, context: SecurityContext) -> ApiResult<DynamicValue> {
    let request: Reschedule = context.decode_body()?;

    let date = parse_date(&request.new_date)?;
    if date < Utc::now().date_naive() {
        return Err(ApiError::validation_failed("Date cannot be in the past"));
    }

    let collection = appointments(&state);
    let filter = doc! { "_id": request.appointment_id.as_str() };
    let mut record = collection.select_404(filter.clone(), NOT_FOUND).await?;

    record.preferred_date = date.format(DATE_FORMAT).to_string();
    record.preferred_time = request.new_time;
    record.touch();
    collection.replace(filter, &record, NOT_FOUND).await?;

    tracing::info!(appointment = %record.id, date = %record.preferred_date, "Appointment rescheduled");

    Ok(ApiResponse::success(record.encode()).with_message("Appointment rescheduled"))
}

/// GET /admin/appointments/date-appointments - `{date}`, ordered by time
pub async fn date_appointments(State(state): State<AppState>, context: SecurityContext) -> ApiResult<DynamicValue> {
    let payload = context.payload()?;
    let date = parse_date(&required_text(&payload, "date", "Date is required")?)?;
    let date = date.format(DATE_FORMAT).to_string();

    let items = appointments(&state)
        .select_any(
            doc! { "preferredDate": date.as_str() },
            FindOptions::sorted(doc! { "preferredTime": 1 }),
        )
        .await?;

    Ok(ApiResponse::success(
        DynamicValue::map()
            .with("date", date)
            .with("items", encode_all(&items)),
    ))
}
