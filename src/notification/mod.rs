//! Delivery of alert text to external messaging services.
//!
//! The rest of the crate only depends on the [`Notifier`](crate::core::Notifier)
//! trait; `telegram` provides the Bot API implementation.
pub mod telegram;

pub use telegram::{NotifyError, TelegramNotifier};
