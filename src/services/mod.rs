pub mod notify;

pub use notify::{notify_in_background, LogNotifier, Notification, Notifier, NotifyError};
