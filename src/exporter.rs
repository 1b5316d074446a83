//! Prometheus gauges, the `/metrics` endpoint and the refresh loop.
//!
//! Four gauges are overwritten on every poll cycle; scrapes observe the
//! most recently written values. The runner keeps two long-lived tasks
//! going: the axum server for `/metrics` and the 10-second poll loop.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use prometheus::{Gauge, IntGauge, Registry, TextEncoder};
use tracing::{debug, error, info, warn};

use crate::source::{self, TemperatureSource};
use crate::stats::CpuStats;

/// Fixed period between poll cycles.
pub const COLLECT_INTERVAL: Duration = Duration::from_secs(10);

// =============================================================================
// Gauges
// =============================================================================

/// The four CPU temperature gauges and their registry.
pub struct CpuGauges {
    registry: Registry,
    core_count: IntGauge,
    temperature_max: Gauge,
    temperature_min: Gauge,
    temperature_avg: Gauge,
}

impl CpuGauges {
    /// Create and register the gauges in a dedicated registry.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let core_count = IntGauge::new("cpu_core_count", "Number of CPU cores")?;
        let temperature_max = Gauge::new(
            "cpu_core_temperature_max",
            "Maximum temperature of all CPU cores",
        )?;
        let temperature_min = Gauge::new(
            "cpu_core_temperature_min",
            "Minimum temperature of all CPU cores",
        )?;
        let temperature_avg = Gauge::new(
            "cpu_core_temperature_avg",
            "Average temperature of all CPU cores",
        )?;

        registry.register(Box::new(core_count.clone()))?;
        registry.register(Box::new(temperature_max.clone()))?;
        registry.register(Box::new(temperature_min.clone()))?;
        registry.register(Box::new(temperature_avg.clone()))?;

        Ok(Self {
            registry,
            core_count,
            temperature_max,
            temperature_min,
            temperature_avg,
        })
    }

    /// Overwrite all four gauges from one cycle's aggregate.
    pub fn set(&self, stats: &CpuStats) {
        self.core_count.set(stats.core_count as i64);
        self.temperature_max.set(stats.max);
        self.temperature_min.set(stats.min);
        self.temperature_avg.set(stats.avg);
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn render(&self) -> prometheus::Result<String> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

// =============================================================================
// HTTP Endpoint
// =============================================================================

/// Build the metrics router.
pub fn router(gauges: Arc<CpuGauges>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(gauges)
}

async fn metrics_handler(
    State(gauges): State<Arc<CpuGauges>>,
) -> Result<String, StatusCode> {
    gauges.render().map_err(|err| {
        error!("rendering metrics: {}", err);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

// =============================================================================
// Runner
// =============================================================================

/// Start the metrics server and the refresh loop, blocking until the
/// server exits.
///
/// Startup failures (unsupported OS, missing collaborator tool, helper
/// never ready, port already bound) are returned to the caller; after
/// startup, fetch failures only skip a cycle.
pub async fn run(port: u16) -> anyhow::Result<()> {
    let source = source::resolve_host().context("error creating temperature source")?;
    info!("selected temperature source: {}", source.name());
    source
        .ensure_ready()
        .await
        .with_context(|| format!("{} is not available", source.name()))?;

    let gauges = Arc::new(CpuGauges::new().context("error registering gauges")?);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("error binding metrics server to port {}", port))?;
    info!("serving metrics on http://0.0.0.0:{}/metrics", port);

    let app = router(gauges.clone());
    tokio::select! {
        res = axum::serve(listener, app).into_future() => res.context("metrics server terminated")?,
        _ = refresh_loop(source.as_ref(), gauges.as_ref()) => {}
    }
    Ok(())
}

/// Collect immediately, then once per interval.
///
/// A failed fetch is logged and the cycle skipped, so scrapes keep
/// seeing the last successful values rather than zeros.
async fn refresh_loop(source: &dyn TemperatureSource, gauges: &CpuGauges) {
    let mut interval = tokio::time::interval(COLLECT_INTERVAL);
    loop {
        interval.tick().await;
        match source.fetch().await {
            Ok(stats) => {
                gauges.set(&stats);
                debug!("collected CPU metrics: {}", stats);
            }
            Err(err) => {
                warn!("error fetching CPU temperature: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stats() -> CpuStats {
        CpuStats {
            core_count: 3,
            max: 55.0,
            min: 45.0,
            avg: 50.0,
        }
    }

    #[test]
    fn test_gauges_render_all_four() {
        let gauges = CpuGauges::new().unwrap();
        gauges.set(&sample_stats());

        let text = gauges.render().unwrap();
        assert!(text.contains("# TYPE cpu_core_count gauge"));
        assert!(text.contains("cpu_core_count 3"));
        assert!(text.contains("cpu_core_temperature_max 55"));
        assert!(text.contains("cpu_core_temperature_min 45"));
        assert!(text.contains("cpu_core_temperature_avg 50"));
    }

    #[test]
    fn test_gauges_overwrite_not_accumulate() {
        let gauges = CpuGauges::new().unwrap();
        gauges.set(&sample_stats());
        gauges.set(&CpuStats {
            core_count: 2,
            max: 61.0,
            min: 59.0,
            avg: 60.0,
        });

        let text = gauges.render().unwrap();
        assert!(text.contains("cpu_core_count 2"));
        assert!(text.contains("cpu_core_temperature_avg 60"));
        assert!(!text.contains("cpu_core_temperature_avg 50"));
    }

    #[tokio::test]
    async fn test_metrics_endpoint_serves_gauges() {
        let gauges = Arc::new(CpuGauges::new().unwrap());
        gauges.set(&sample_stats());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(gauges);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let body = reqwest::get(format!("http://{}/metrics", addr))
            .await
            .unwrap()
            .error_for_status()
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains("cpu_core_count 3"));
        assert!(body.contains("cpu_core_temperature_max 55"));
        assert!(body.contains("cpu_core_temperature_min 45"));
        assert!(body.contains("cpu_core_temperature_avg 50"));
    }
}
