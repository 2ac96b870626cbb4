//! Prometheus metrics.
//!
//! Counters are recorded through the `metrics` facade everywhere in the
//! crate. When a metrics port is configured the binary installs a Prometheus
//! recorder and serves `/metrics` from a separate listener.
//!
//! Metric names:
//! - `snippets_created_total`: snippets stored through the create form
//! - `http_panics_total`: requests whose handling panicked

use std::net::SocketAddr;

use axum::{Router, routing::get};
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and describe the application's metrics.
///
/// Fails if a recorder is already installed.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {e}"))?;

    register_metrics();

    Ok(handle)
}

/// Serve `/metrics` on `port` in a background task.
///
/// The listener is bound before returning so a busy port is reported to the
/// caller.
pub async fn start_metrics_server(port: u16, handle: PrometheusHandle) -> std::io::Result<()> {
    let app = Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Metrics server listening on http://{}/metrics", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "metrics server stopped");
        }
    });

    Ok(())
}

fn register_metrics() {
    describe_counter!(
        "snippets_created_total",
        "Number of snippets stored through the create form"
    );
    describe_counter!(
        "http_panics_total",
        "Number of requests whose handling panicked"
    );
}
