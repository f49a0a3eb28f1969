//! Prometheus metrics for request counting and latency tracking.
//!
//! Metrics are recorded unconditionally. They are only exported when
//! `METRICS_PORT` is set, on a listener separate from the app port.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tracing::debug;

// === Metric Name Constants ===

/// HTTP requests counter metric name.
pub const METRIC_HTTP_REQUESTS: &str = "http_requests_total";
/// Page render latency metric name.
pub const METRIC_PAGE_RENDER_LATENCY: &str = "page_render_latency_ms";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_counter!(
        METRIC_HTTP_REQUESTS,
        "Total number of HTTP requests handled, by route"
    );
    describe_histogram!(
        METRIC_PAGE_RENDER_LATENCY,
        "Index page template render latency in milliseconds"
    );

    debug!("Metrics initialized");
}

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn install_exporter(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()
}

/// Increment the request counter for `route`.
pub fn inc_http_requests(route: &'static str) {
    counter!(METRIC_HTTP_REQUESTS, "route" => route).increment(1);
}

/// Records the index page render latency when dropped.
pub struct RenderTimer(Instant);

impl RenderTimer {
    /// Start timing a page render.
    pub fn start() -> Self {
        Self(Instant::now())
    }
}

impl Drop for RenderTimer {
    fn drop(&mut self) {
        let latency_ms = self.0.elapsed().as_secs_f64() * 1000.0;
        histogram!(METRIC_PAGE_RENDER_LATENCY).record(latency_ms);
    }
}
