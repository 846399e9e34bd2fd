//! # Prometheus Metrics
//!
//! Operational metrics for the auction node, scraped at `/metrics` on the
//! metrics port. Everything lives in a dedicated [`prometheus::Registry`]
//! under the `gavel` namespace.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::core::Collector;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// All metric handles for the node. Handles are cheap to clone.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    pub auctions_created_total: IntCounter,
    pub bids_accepted_total: IntCounter,
    /// Rejected bids, labelled with the error code.
    pub bids_rejected_total: IntCounterVec,
    pub auctions_ended_total: IntCounter,
    pub auctions_cancelled_total: IntCounter,
    /// Accepted bids that pushed the end time out.
    pub snipe_extensions_total: IntCounter,
    /// Current clock height.
    pub block_height: IntGauge,
    /// Engine call latency, labelled with the operation name.
    pub operation_latency_seconds: HistogramVec,
}

fn register<C: Collector + Clone + 'static>(
    registry: &Registry,
    metric: C,
) -> Result<C, prometheus::Error> {
    registry.register(Box::new(metric.clone()))?;
    Ok(metric)
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("gavel".into()), None)?;

        let auctions_created_total = register(
            &registry,
            IntCounter::new("auctions_created_total", "Auctions listed")?,
        )?;
        let bids_accepted_total = register(
            &registry,
            IntCounter::new("bids_accepted_total", "Bids accepted")?,
        )?;
        let bids_rejected_total = register(
            &registry,
            IntCounterVec::new(
                Opts::new("bids_rejected_total", "Bids rejected, by error code"),
                &["code"],
            )?,
        )?;
        let auctions_ended_total = register(
            &registry,
            IntCounter::new("auctions_ended_total", "Auctions settled or closed unbid")?,
        )?;
        let auctions_cancelled_total = register(
            &registry,
            IntCounter::new("auctions_cancelled_total", "Auctions cancelled by their seller")?,
        )?;
        let snipe_extensions_total = register(
            &registry,
            IntCounter::new(
                "snipe_extensions_total",
                "Late bids that extended an auction's end time",
            )?,
        )?;
        let block_height = register(
            &registry,
            IntGauge::new("block_height", "Current clock height in time units")?,
        )?;
        let operation_latency_seconds = register(
            &registry,
            HistogramVec::new(
                HistogramOpts::new(
                    "operation_latency_seconds",
                    "Latency of engine operations in seconds",
                )
                .buckets(vec![
                    0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05, 0.1,
                ]),
                &["operation"],
            )?,
        )?;

        Ok(Self {
            registry,
            auctions_created_total,
            bids_accepted_total,
            bids_rejected_total,
            auctions_ended_total,
            auctions_cancelled_total,
            snipe_extensions_total,
            block_height,
            operation_latency_seconds,
        })
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
