// ===============================
// src/main.rs
// ===============================
/*
 cd fill_pnl_rust

 # offline (tanpa harga), cek agregasi saja
 cargo run -- fills.csv --offline

 # dengan harga OKX + chart feed + metrics textfile
 RECORD_FILE=out/chart.jsonl METRICS_FILE=out/run.prom cargo run -- fills.csv -o out/portfolio.csv
*/
/*
=============================================================================
Project : fill_pnl_rust — fill history -> per-asset position & unrealized PnL
Module  : main.rs
Version : 0.1.0
License : MIT (see LICENSE)

Summary : Reads a venue fill export (CSV), classifies fills, aggregates cost
          basis per symbol, prices each symbol from the OKX public ticker,
          and writes a summary sheet plus optional chart feed / metrics.
=============================================================================
*/
mod domain;
mod error;
mod config;
mod metrics;
mod normalize;
mod classifier;
mod positions;
mod okx;              // OKX ticker models + instrument ids
mod oracle;           // PriceSource: OKX REST / offline
mod valuation;
mod pipeline;
mod posttrade;        // summary table -> log
mod export;           // summary sheet (CSV)
mod recorder;         // chart feed (JSONL)

use std::fs::File;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Args;
use crate::error::PipelineError;
use crate::oracle::{Offline, OkxTicker};
use crate::pipeline::RunReport;

#[tokio::main]
async fn main() {
    // ---- Logging ----
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ---- Load config ----
    let args = config::load();

    // ---- Metrics ----
    metrics::init();

    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        quote_base_url = %args.quote_base_url,
        quote_ccy = %args.quote_ccy,
        quote_timeout_ms = args.quote_timeout_ms,
        offline = args.offline,
        record_file = ?args.record_file,
        metrics_file = ?args.metrics_file,
        "startup config"
    );

    if let Err(e) = run(&args).await {
        error!(error = %e, "run failed, nothing exported");
        std::process::exit(1);
    }
}

async fn run(args: &Args) -> Result<(), PipelineError> {
    let input = File::open(&args.input)
        .map_err(|e| PipelineError::Config(format!("input {}: {e}", args.input.display())))?;

    // ---- Pipeline ----
    let report: RunReport = if args.offline {
        pipeline::run(input, &Offline).await?
    } else {
        let okx = OkxTicker::new(&args.quote_base_url, &args.quote_ccy, args.quote_timeout())?;
        pipeline::run(input, &okx).await?
    };

    // ---- Report / export ----
    posttrade::log_summary(&report);
    export::write_summary_file(&args.output, &report.positions)?;
    info!(path = %args.output.display(), rows = report.positions.len(), "summary exported");

    if let Some(path) = &args.record_file {
        let events = recorder::record_report(&report, path)
            .await
            .map_err(|e| PipelineError::Export(format!("chart feed {}: {e}", path.display())))?;
        info!(path = %path.display(), events, "chart feed written");
    }

    if let Some(path) = &args.metrics_file {
        metrics::write_textfile(path)
            .map_err(|e| PipelineError::Export(format!("metrics {}: {e}", path.display())))?;
    }
    Ok(())
}
