// ===============================
// src/metrics.rs
// ===============================
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, GaugeVec, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use std::path::Path;

// Single custom registry (we register everything here)
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

// -------- Ingestion --------
pub static FILLS: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("fills_total", "fills accepted into aggregation").unwrap());

pub static ROWS_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("rows_rejected_total", "input rows dropped (label: reason)"),
        &["reason"],
    )
    .unwrap()
});

pub static POSITIONS: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("positions", "distinct symbols in the summary").unwrap());

// -------- Quotes --------
pub static QUOTES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("quote_requests_total", "ticker lookups by outcome"),
        &["outcome"],
    )
    .unwrap()
});

pub static QUOTE_LATENCY: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("quote_latency_ms", "ticker request latency (ms)")
            .buckets(vec![25.0, 50.0, 100.0, 250.0, 500.0, 1_000.0, 2_500.0, 5_000.0]),
    )
    .unwrap()
});

// -------- Valuation --------
pub static POSITION_PNL: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        Opts::new("position_pnl", "unrealized PnL per symbol (quote currency)"),
        &["symbol"],
    )
    .unwrap()
});

pub fn init() {
    // Register all metrics to the custom registry
    for m in [
        REGISTRY.register(Box::new(FILLS.clone())),
        REGISTRY.register(Box::new(ROWS_REJECTED.clone())),
        REGISTRY.register(Box::new(POSITIONS.clone())),
        REGISTRY.register(Box::new(QUOTES.clone())),
        REGISTRY.register(Box::new(QUOTE_LATENCY.clone())),
        REGISTRY.register(Box::new(POSITION_PNL.clone())),
    ] {
        let _ = m;
    }
}

// Encode all metrics in Prometheus text format
fn encode_metrics() -> Vec<u8> {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();
    let mut buf = Vec::new();
    if encoder.encode(&families, &mut buf).is_err() || buf.is_empty() {
        buf.extend_from_slice(b"# no metrics\n");
    }
    buf
}

/// Batch run: no scrape endpoint, dump a textfile for node_exporter instead.
pub fn write_textfile(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, encode_metrics())
}
