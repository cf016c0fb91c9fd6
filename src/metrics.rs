/// Metrics Module - Prometheus Instrumentation
///
/// Process-wide counters for decode outcomes and output classification,
/// exposed in Prometheus text format on `GET /metrics`.

use lazy_static::lazy_static;
use once_cell::sync::OnceCell;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Instant;

/// Decode latency buckets (seconds). Decoding is in-memory so these are small.
const DECODE_BUCKETS: &[f64] = &[0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1];

static INIT: OnceCell<()> = OnceCell::new();

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Decode attempts by outcome
    /// Labels: outcome (ok, empty_input, invalid_hex, truncated, trailing_bytes)
    pub static ref DECODES: IntCounterVec = IntCounterVec::new(
        Opts::new("txdecode_decodes_total", "Transaction decode attempts by outcome"),
        &["outcome"]
    ).expect("valid metric definition");

    /// Classified outputs by script type
    pub static ref OUTPUTS_CLASSIFIED: IntCounterVec = IntCounterVec::new(
        Opts::new("txdecode_outputs_classified_total", "Outputs classified by script type"),
        &["script_type"]
    ).expect("valid metric definition");

    /// Time to decode and build one report
    pub static ref DECODE_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new("txdecode_decode_duration_seconds", "Time to decode a transaction and build its report")
            .buckets(DECODE_BUCKETS.to_vec())
    ).expect("valid metric definition");
}

/// Register all metrics with the global registry. Safe to call repeatedly.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    INIT.get_or_try_init(|| {
        REGISTRY.register(Box::new(DECODES.clone()))?;
        REGISTRY.register(Box::new(OUTPUTS_CLASSIFIED.clone()))?;
        REGISTRY.register(Box::new(DECODE_DURATION.clone()))?;
        Ok::<(), prometheus::Error>(())
    })?;
    Ok(())
}

/// Gather metrics in Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Timer for measuring durations
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
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

/// Record a decode attempt
pub fn record_decode(outcome: &str, duration_secs: f64) {
    DECODES.with_label_values(&[outcome]).inc();
    DECODE_DURATION.observe(duration_secs);
}

/// Record one classified output
pub fn increment_outputs_classified(script_type: &str) {
    OUTPUTS_CLASSIFIED.with_label_values(&[script_type]).inc();
}
