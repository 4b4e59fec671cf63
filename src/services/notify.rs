use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::database::models::Appointment;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Appointment {0} has no email address")]
    NoRecipient(String),

    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Which mail goes out for an appointment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Received,
    Confirmed,
}

/// Outbound patient notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn appointment_received(&self, appointment: &Appointment) -> Result<(), NotifyError>;

    async fn appointment_confirmed(&self, appointment: &Appointment) -> Result<(), NotifyError>;
}

/// Writes notifications to the log instead of sending mail
#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    sender: Option<String>,
}

impl LogNotifier {
    pub fn new(sender: Option<String>) -> Self {
        Self { sender }
    }

    fn recipient<'a>(&self, appointment: &'a Appointment) -> Result<&'a str, NotifyError> {
        appointment
            .email
            .as_deref()
            .ok_or_else(|| NotifyError::NoRecipient(appointment.id.clone()))
    }

    fn sender(&self) -> &str {
        self.sender.as_deref().unwrap_or("clinic@localhost")
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn appointment_received(&self, appointment: &Appointment) -> Result<(), NotifyError> {
        let to = self.recipient(appointment)?;
        tracing::info!(
            from = self.sender(),
            to,
            appointment = %appointment.id,
            "Appointment request received for {} on {}",
            appointment.name,
            appointment.preferred_date
        );
        Ok(())
    }

    async fn appointment_confirmed(&self, appointment: &Appointment) -> Result<(), NotifyError> {
        let to = self.recipient(appointment)?;
        tracing::info!(
            from = self.sender(),
            to,
            appointment = %appointment.id,
            "Appointment confirmed for {} on {} at {}",
            appointment.name,
            appointment.preferred_date,
            appointment.preferred_time
        );
        Ok(())
    }
}

/// Fire-and-forget delivery. Failures are logged and never reach the caller.
pub fn notify_in_background(notifier: Arc<dyn Notifier>, kind: Notification, appointment: Appointment) {
    tokio::spawn(async move {
        let result = match kind {
            Notification::Received => notifier.appointment_received(&appointment).await,
            Notification::Confirmed => notifier.appointment_confirmed(&appointment).await,
        };
        if let Err(e) = result {
            tracing::error!("Failed to send {:?} notification: {}", kind, e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{AppointmentRequest, AppointmentStatus};

    fn appointment(email: Option<&str>) -> Appointment {
        Appointment::from_request(AppointmentRequest {
            name: "Kabir".into(),
            email: email.map(str::to_string),
            phone: "9876543210".into(),
            service: "Dental".into(),
            message: String::new(),
            preferred_date: "2026-05-01".into(),
            preferred_time: "09:00".into(),
        })
    }

    #[tokio::test]
    async fn log_notifier_requires_a_recipient() {
        let notifier = LogNotifier::new(Some("front-desk@clinic.test".into()));
        assert!(notifier.appointment_received(&appointment(Some("k@example.com"))).await.is_ok());

        let missing = appointment(None);
        assert_eq!(missing.status, AppointmentStatus::Pending);
        assert!(matches!(
            notifier.appointment_confirmed(&missing).await,
            Err(NotifyError::NoRecipient(_))
        ));
    }

    #[tokio::test]
    async fn background_failures_are_swallowed() {
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier::default());
        notify_in_background(notifier, Notification::Confirmed, appointment(None));
        tokio::task::yield_now().await;
    }
}
