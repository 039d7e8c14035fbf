//! Core domain types and service traits for reqalert
//!
//! This module defines the data captured from an inbound request, the result
//! shapes of the two outbound calls, and the trait contracts that let the
//! host server, the geolocation lookup and the notifier be swapped out in
//! tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;

pub const UNKNOWN_IP: &str = "Unknown IP";
pub const UNKNOWN_USER_AGENT: &str = "Unknown User-Agent";
pub const UNKNOWN_METHOD: &str = "Unknown Method";
pub const UNKNOWN_URL: &str = "Unknown URL";
pub const UNKNOWN_LOCATION: &str = "Lokasi tidak diketahui";

/// Immutable capture of one inbound request at the moment it was inspected.
///
/// Every field is always non-empty. Missing source data is replaced by one of
/// the `UNKNOWN_*` literals, and the structured fields fall back to `{}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestSnapshot {
    /// Forwarded-for chain, connection address, or `UNKNOWN_IP`.
    pub address: String,
    pub agent: String,
    pub method: String,
    /// Path and query as received.
    pub path: String,
    /// Pretty-printed JSON of the query parameters.
    pub query: String,
    /// Pretty-printed JSON of the request headers.
    pub headers: String,
    /// Human-readable location or an explanatory fallback.
    pub location: String,
    /// Capture time in Asia/Jakarta.
    pub timestamp: String,
}

/// Outcome of a single geolocation lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoLookupResult {
    Success {
        city: String,
        region: String,
        country: String,
        lat: f64,
        lon: f64,
    },
    Failure {
        reason: Option<String>,
    },
}

impl GeoLookupResult {
    /// Renders the result as the display string stored in
    /// [`RequestSnapshot::location`].
    pub fn display(&self) -> String {
        match self {
            GeoLookupResult::Success {
                city,
                region,
                country,
                ..
            } => format!("{}, {}, {}", city, region, country),
            GeoLookupResult::Failure { reason } => format!(
                "{} ({})",
                UNKNOWN_LOCATION,
                reason.as_deref().unwrap_or("Gagal mendapatkan lokasi")
            ),
        }
    }
}

/// What happened to a notification. Never an error: the caller's request path
/// must not depend on delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The messaging API acknowledged the message.
    Sent,
    /// Credentials are not configured; nothing was sent.
    Skipped,
    /// The API answered but refused the message.
    Rejected { description: String },
    /// The call itself failed (connection, timeout, unreadable response).
    Failed { error: String },
}

impl DeliveryOutcome {
    /// Label used for logging and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Sent => "sent",
            DeliveryOutcome::Skipped => "skipped",
            DeliveryOutcome::Rejected { .. } => "rejected",
            DeliveryOutcome::Failed { .. } => "failed",
        }
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// The view of an inbound HTTP request that the describer needs.
///
/// Implemented for the axum/http request types; tests can provide their own.
pub trait RequestSource {
    /// Returns a header value by (case-insensitive) name, if present and
    /// readable as text.
    fn header(&self, name: &str) -> Option<String>;

    /// All headers, keyed by lowercase name.
    fn header_map(&self) -> BTreeMap<String, String>;

    /// The low-level peer address of the connection.
    fn remote_addr(&self) -> Option<IpAddr>;

    fn method(&self) -> Option<String>;

    /// The original request target (path plus query string).
    fn url(&self) -> Option<String>;

    /// Parsed query parameters. `None` when the request has no query.
    fn query(&self) -> Option<BTreeMap<String, String>>;
}

/// Maps a network address to a human-readable location.
#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// Looks up `address` and returns a display string.
    ///
    /// Never fails: service-reported failures and transport errors are both
    /// folded into a descriptive fallback string.
    async fn locate(&self, address: &str) -> String;
}

/// Delivers raw alert text to a messaging endpoint.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Escapes, wraps and sends `raw_message`. Never fails outward.
    async fn notify(&self, raw_message: &str) -> DeliveryOutcome;
}

/// Renders `err` followed by each of its sources, joined with `": "`.
///
/// Transport errors from reqwest only name the failed step at the top level;
/// the reason (refused connection, bad certificate, ...) is in the sources.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
