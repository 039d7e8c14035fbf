//! # Internal Metrics Module
//!
//! Counters for the two outbound side channels and for the server hook.
//! The `metrics` macros are no-ops until a recorder is installed, so these
//! helpers are safe to call from tests and from a server running with
//! metrics disabled.
//!
//! When enabled, [`install_prometheus`] installs a Prometheus recorder and
//! returns the handle the server renders at `/metrics`.

use anyhow::Result;
use metrics::Unit;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

pub const GEO_LOOKUPS_TOTAL: &str = "geo_lookups_total";
pub const NOTIFICATIONS_TOTAL: &str = "notifications_total";
pub const HOOK_TRIGGERS_TOTAL: &str = "hook_triggers_total";

/// Registers descriptions for all metrics emitted by the crate.
pub fn describe() {
    metrics::describe_counter!(
        GEO_LOOKUPS_TOTAL,
        Unit::Count,
        "Total number of geolocation lookups, labeled by outcome."
    );
    metrics::describe_counter!(
        NOTIFICATIONS_TOTAL,
        Unit::Count,
        "Total number of notification attempts, labeled by outcome."
    );
    metrics::describe_counter!(
        HOOK_TRIGGERS_TOTAL,
        Unit::Count,
        "Total number of requests that triggered an alert, labeled by reason."
    );
}

/// Installs the global Prometheus recorder.
///
/// Fails if a recorder has already been installed in this process.
pub fn install_prometheus() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe();
    info!("Prometheus recorder installed.");
    Ok(handle)
}

pub fn record_geo_lookup(outcome: &'static str) {
    metrics::counter!(GEO_LOOKUPS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_notification(outcome: &'static str) {
    metrics::counter!(NOTIFICATIONS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_hook_trigger(reason: &'static str) {
    metrics::counter!(HOOK_TRIGGERS_TOTAL, "reason" => reason).increment(1);
}
