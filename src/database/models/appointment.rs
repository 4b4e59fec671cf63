use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::dynamic::DynamicValue;
use crate::error::ApiError;
use crate::types::{optional_text, text_field, Decodable, Encodable};

pub const COLLECTION: &str = "appointments";

/// Calendar dates on the wire and in the store
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "cancelled" | "canceled" => Ok(AppointmentStatus::Cancelled),
            _ => Err(ApiError::validation_failed(
                "Status must be one of pending, confirmed, cancelled",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub service: String,
    pub message: String,
    pub preferred_date: String,
    pub preferred_time: String,
    pub status: AppointmentStatus,
    /// Epoch millis
    pub created_at: i64,
    pub updated_at: Option<i64>,
}

impl Appointment {
    /// New pending appointment from a validated booking request
    pub fn from_request(request: AppointmentRequest) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: request.name,
            email: request.email,
            phone: request.phone,
            service: request.service,
            message: request.message,
            preferred_date: request.preferred_date,
            preferred_time: request.preferred_time,
            status: AppointmentStatus::Pending,
            created_at: Utc::now().timestamp_millis(),
            updated_at: None,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now().timestamp_millis());
    }
}

impl Encodable for Appointment {
    fn encode(&self) -> DynamicValue {
        DynamicValue::map()
            .with("_id", self.id.as_str())
            .with("name", self.name.as_str())
            .with("email", self.email.clone())
            .with("phone", self.phone.as_str())
            .with("service", self.service.as_str())
            .with("message", self.message.as_str())
            .with("preferredDate", self.preferred_date.as_str())
            .with("preferredTime", self.preferred_time.as_str())
            .with("status", self.status.as_str())
            .with("createdAt", self.created_at)
            .with("updatedAt", self.updated_at)
    }
}

impl Decodable for Appointment {
    fn decode(value: &DynamicValue) -> Result<Self, ApiError> {
        let id = text_field(value, "_id");
        if id.is_empty() {
            return Err(ApiError::malformed_payload("Appointment record is missing its id"));
        }

        Ok(Self {
            id,
            name: text_field(value, "name"),
            email: optional_text(value, "email"),
            phone: text_field(value, "phone"),
            service: text_field(value, "service"),
            message: text_field(value, "message"),
            preferred_date: text_field(value, "preferredDate"),
            preferred_time: text_field(value, "preferredTime"),
            status: text_field(value, "status").parse().unwrap_or(AppointmentStatus::Pending),
            created_at: value["createdAt"].int_value(),
            updated_at: value["updatedAt"].as_i64(),
        })
    }
}

/// Public booking form
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub service: String,
    pub message: String,
    pub preferred_date: String,
    pub preferred_time: String,
}

impl Decodable for AppointmentRequest {
    fn decode(value: &DynamicValue) -> Result<Self, ApiError> {
        if value.as_map().is_none() {
            return Err(ApiError::malformed_payload("Expected a JSON object"));
        }

        Ok(Self {
            name: text_field(value, "name"),
            email: optional_text(value, "email"),
            phone: text_field(value, "phone"),
            service: text_field(value, "service"),
            message: text_field(value, "message"),
            preferred_date: text_field(value, "preferredDate"),
            preferred_time: text_field(value, "preferredTime"),
        })
    }
}

impl AppointmentRequest {
    /// Booking rules. Dates from yesterday onward pass, so clients a timezone
    /// behind the server are not rejected.
    pub fn validate(&self, today: NaiveDate) -> Result<(), ApiError> {
        if self.name.is_empty() {
            return Err(ApiError::validation_failed("Name is required"));
        }

        let digits = self.phone.chars().filter(char::is_ascii_digit).count();
        if digits < 10 {
            return Err(ApiError::validation_failed("Phone must be at least 10 digits"));
        }

        let date = parse_date(&self.preferred_date)?;
        if date < today - chrono::Duration::days(1) {
            return Err(ApiError::validation_failed("Date cannot be in the past"));
        }

        Ok(())
    }
}

pub fn parse_date(input: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .map_err(|_| ApiError::validation_failed("Date must use the YYYY-MM-DD format"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AppointmentRequest {
        AppointmentRequest {
            name: "Meera".into(),
            email: Some("meera@example.com".into()),
            phone: "+91 98765 43210".into(),
            service: "Physiotherapy".into(),
            message: String::new(),
            preferred_date: "2026-03-10".into(),
            preferred_time: "10:30".into(),
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn decode_trims_every_field() {
        let value = DynamicValue::map()
            .with("name", "  Meera ")
            .with("email", "   ")
            .with("phone", " 9876543210 ")
            .with("preferredDate", "2026-03-10 ");
        let decoded = AppointmentRequest::decode(&value).unwrap();
        assert_eq!(decoded.name, "Meera");
        assert_eq!(decoded.email, None);
        assert_eq!(decoded.phone, "9876543210");
        assert_eq!(decoded.preferred_date, "2026-03-10");
    }

    #[test]
    fn decode_rejects_non_objects() {
        let err = AppointmentRequest::decode(&DynamicValue::from("text")).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn validation_rules() {
        let today = day("2026-03-10");
        assert!(request().validate(today).is_ok());

        let mut r = request();
        r.name.clear();
        assert_eq!(r.validate(today).unwrap_err().message(), "Name is required");

        let mut r = request();
        r.phone = "12345".into();
        assert_eq!(r.validate(today).unwrap_err().message(), "Phone must be at least 10 digits");

        let mut r = request();
        r.preferred_date = "10/03/2026".into();
        assert_eq!(r.validate(today).unwrap_err().status_code(), 400);

        let mut r = request();
        r.preferred_date = "2026-03-09".into();
        assert!(r.validate(today).is_ok());
        r.preferred_date = "2026-03-08".into();
        assert_eq!(r.validate(today).unwrap_err().message(), "Date cannot be in the past");
    }

    #[test]
    fn store_round_trip_keeps_the_record() {
        let mut appointment = Appointment::from_request(request());
        appointment.touch();
        let document = appointment.encode().to_document(&[]).unwrap();
        let restored = Appointment::decode(&DynamicValue::from_document(document)).unwrap();
        assert_eq!(restored, appointment);
        assert_eq!(restored.status, AppointmentStatus::Pending);
    }

    #[test]
    fn status_parsing() {
        assert_eq!("Confirmed".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::Confirmed);
        assert_eq!("canceled".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::Cancelled);
        assert!("done".parse::<AppointmentStatus>().is_err());
    }
}
