//! The host server run by the `reqalert` binary.
//!
//! A small axum application with the alert hook installed in front of every
//! route, plus an unhooked `/metrics` endpoint when Prometheus is enabled.

use crate::config::Config;
use crate::core::{GeoLocator, Notifier};
use crate::describe::RequestDescriber;
use crate::geo::{IpApiLocator, NoOpLocator};
use crate::hook::{alert_on_interest, AlertHook};
use crate::notification::TelegramNotifier;
use anyhow::Result;
use axum::http::StatusCode;
use axum::{middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Wires the locator, describer and notifier selected by `config` into a hook.
pub fn build_hook(config: &Config) -> AlertHook {
    let locator: Arc<dyn GeoLocator> = if config.geo.enabled {
        Arc::new(IpApiLocator::new(config.geo.base_url.clone()))
    } else {
        Arc::new(NoOpLocator)
    };
    let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(config.telegram.clone()));
    AlertHook::new(&config.server, RequestDescriber::new(locator), notifier)
}

/// Builds the application router.
///
/// Every route and the 404 fallback pass through the hook; `/metrics` is
/// added afterwards so scrapes are never reported.
pub fn router(hook: AlertHook, prometheus: Option<PrometheusHandle>) -> Router {
    let app = Router::new()
        .route("/", get(|| async { "reqalert" }))
        .route("/healthz", get(|| async { "ok" }))
        .fallback(|| async { (StatusCode::NOT_FOUND, "not found") })
        .layer(middleware::from_fn_with_state(hook, alert_on_interest));

    match prometheus {
        Some(handle) => app.route("/metrics", get(move || async move { handle.render() })),
        None => app,
    }
}

/// Serves `router` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;
    info!("Server stopped.");
    Ok(())
}
