//! Host-server integration.
//!
//! [`alert_on_interest`] is an axum middleware. It lets every request through
//! untouched and, when a request turns out to be of interest, describes it and
//! sends a notification from a separate task so the response is never held up
//! by either outbound call.

use crate::config::ServerConfig;
use crate::core::{DeliveryOutcome, Notifier, RequestSource};
use crate::describe::{CapturedRequest, RequestDescriber};
use crate::formatting::{AlertFormatter, PlainTextFormatter};
use crate::internal_metrics;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;
use tracing::{debug, info};

/// Why a request was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// The path starts with one of the watched prefixes.
    WatchedPath,
    /// The inner service answered with a 5xx status.
    ServerError(StatusCode),
}

impl TriggerReason {
    /// First line of the alert text.
    pub fn headline(&self) -> String {
        match self {
            TriggerReason::WatchedPath => "Akses ke path yang dipantau".to_string(),
            TriggerReason::ServerError(status) => format!("Server error {}", status),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            TriggerReason::WatchedPath => "watched_path",
            TriggerReason::ServerError(_) => "server_error",
        }
    }
}

/// Shared state for the middleware: what to watch and where to report.
#[derive(Clone)]
pub struct AlertHook {
    describer: RequestDescriber,
    notifier: Arc<dyn Notifier>,
    formatter: Arc<dyn AlertFormatter>,
    watched_paths: Arc<[String]>,
    alert_on_server_error: bool,
}

impl AlertHook {
    pub fn new(
        config: &ServerConfig,
        describer: RequestDescriber,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            describer,
            notifier,
            formatter: Arc::new(PlainTextFormatter),
            watched_paths: config.watched_paths.clone().into(),
            alert_on_server_error: config.alert_on_server_error,
        }
    }

    /// Replaces the default plain-text formatter.
    pub fn with_formatter(mut self, formatter: Arc<dyn AlertFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Decides whether a request with `path` that produced `status` is
    /// reported. Watched paths take precedence over server errors.
    pub fn trigger_for(&self, path: &str, status: StatusCode) -> Option<TriggerReason> {
        if self
            .watched_paths
            .iter()
            .any(|prefix| !prefix.is_empty() && path.starts_with(prefix.as_str()))
        {
            Some(TriggerReason::WatchedPath)
        } else if self.alert_on_server_error && status.is_server_error() {
            Some(TriggerReason::ServerError(status))
        } else {
            None
        }
    }

    /// Describes `request`, formats the alert and sends it.
    ///
    /// The two outbound calls run one after the other: the notification is
    /// only composed once the snapshot, location included, is complete.
    pub async fn report<R: RequestSource + ?Sized>(
        &self,
        reason: TriggerReason,
        request: &R,
    ) -> DeliveryOutcome {
        let snapshot = self.describer.describe(request).await;
        let text = self.formatter.format(&reason.headline(), &snapshot);
        self.notifier.notify(&text).await
    }
}

/// Axum middleware that reports requests of interest.
///
/// Install with `axum::middleware::from_fn_with_state(hook, alert_on_interest)`.
/// The router must be served with `into_make_service_with_connect_info` for
/// the peer address to be available.
pub async fn alert_on_interest(
    State(hook): State<AlertHook>,
    request: Request,
    next: Next,
) -> Response {
    let captured = CapturedRequest::capture(&request);
    let response = next.run(request).await;

    if let Some(reason) = hook.trigger_for(captured.path(), response.status()) {
        info!(path = captured.path(), reason = reason.label(), "Reporting request");
        internal_metrics::record_hook_trigger(reason.label());
        tokio::spawn(async move {
            let outcome = hook.report(reason, &captured).await;
            debug!(outcome = outcome.as_str(), "Report finished");
        });
    }

    response
}
