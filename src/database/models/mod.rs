pub mod admin_user;
pub mod appointment;

pub use admin_user::AdminUser;
pub use appointment::{Appointment, AppointmentRequest, AppointmentStatus};
