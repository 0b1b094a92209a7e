//! Metrics collection and export module

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Instant;

/// Submission pipeline metrics
pub struct Metrics {
    registry: Registry,

    // Counters
    pub tx_submitted: IntCounter,
    pub tx_succeeded: IntCounter,
    /// Labelled by error category
    pub tx_failed: IntCounterVec,
    pub nonce_retries: IntCounter,
    /// Labelled by JSON-RPC method
    pub rpc_requests: IntCounterVec,
    /// Labelled by error category
    pub rpc_errors: IntCounterVec,

    // Histograms
    pub tx_submit_latency: Histogram,
}

impl Metrics {
    /// Create a metrics set with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let tx_submitted = IntCounter::with_opts(Opts::new(
            "tx_submitted_total",
            "Signed transactions handed to send_tx",
        ))?;

        let tx_succeeded = IntCounter::with_opts(Opts::new(
            "tx_succeeded_total",
            "Transactions whose outcome was a success",
        ))?;

        let tx_failed = IntCounterVec::new(
            Opts::new("tx_failed_total", "Transactions that ended in an error"),
            &["category"],
        )?;

        let nonce_retries = IntCounter::with_opts(Opts::new(
            "nonce_retries_total",
            "Re-signs after an invalid nonce",
        ))?;

        let rpc_requests = IntCounterVec::new(
            Opts::new("rpc_requests_total", "JSON-RPC requests sent"),
            &["method"],
        )?;

        let rpc_errors = IntCounterVec::new(
            Opts::new("rpc_errors_total", "JSON-RPC requests that failed"),
            &["category"],
        )?;

        let tx_submit_latency = Histogram::with_opts(
            HistogramOpts::new(
                "tx_submit_latency_seconds",
                "Time from resolve to settled outcome",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        )?;

        registry.register(Box::new(tx_submitted.clone()))?;
        registry.register(Box::new(tx_succeeded.clone()))?;
        registry.register(Box::new(tx_failed.clone()))?;
        registry.register(Box::new(nonce_retries.clone()))?;
        registry.register(Box::new(rpc_requests.clone()))?;
        registry.register(Box::new(rpc_errors.clone()))?;
        registry.register(Box::new(tx_submit_latency.clone()))?;

        Ok(Self {
            registry,
            tx_submitted,
            tx_succeeded,
            tx_failed,
            nonce_retries,
            rpc_requests,
            rpc_errors,
            tx_submit_latency,
        })
    }

    /// Get the registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_rpc_request(&self, method: &str) {
        self.rpc_requests.with_label_values(&[method]).inc();
    }

    pub fn record_rpc_error(&self, category: &str) {
        self.rpc_errors.with_label_values(&[category]).inc();
    }

    pub fn record_tx_failed(&self, category: &str) {
        self.tx_failed.with_label_values(&[category]).inc();
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn gather(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        histogram.observe(self.elapsed_secs());
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
