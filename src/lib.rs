//! reqalert - request alerting for HTTP servers
//!
//! This library captures metadata from inbound HTTP requests (origin, client,
//! approximate location) and relays alerts about them to a Telegram chat.
//! The two public operations are [`RequestDescriber::describe`] and
//! [`Notifier::notify`]; everything else wires them into a host server.

pub mod cli;
pub mod config;
pub mod core;
pub mod describe;
pub mod escape;
pub mod formatting;
pub mod geo;
pub mod hook;
pub mod internal_metrics;
pub mod notification;
pub mod server;

// Re-export core types for convenience
pub use crate::core::*;
pub use describe::RequestDescriber;
pub use notification::TelegramNotifier;
