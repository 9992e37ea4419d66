// ===============================
// src/config.rs
// ===============================
/*
=============================================================================
Project : fill_pnl_rust — fill history -> per-asset position & unrealized PnL
Module  : config.rs
Version : 0.1.0
License : MIT (see LICENSE)

Summary : Reads a venue fill export (CSV), classifies fills, aggregates cost
          basis per symbol, prices each symbol from the OKX public ticker,
          and writes a summary sheet plus optional chart feed / metrics.
=============================================================================
*/
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use dotenvy::dotenv;

pub const DEFAULT_QUOTE_BASE_URL: &str = "https://www.okx.com";

#[derive(Parser, Clone, Debug)]
#[command(name = "fill_pnl_rust", version, about = "Per-asset position & unrealized PnL from a fill export")]
pub struct Args {
    /// Fill export (CSV)
    #[arg(env = "FILLS_FILE")]
    pub input: PathBuf,

    /// Summary sheet (CSV, opens in any spreadsheet app)
    #[arg(long, short, env = "EXPORT_FILE", default_value = "crypto_portfolio.csv")]
    pub output: PathBuf,

    #[arg(long, env = "QUOTE_BASE_URL", default_value = DEFAULT_QUOTE_BASE_URL)]
    pub quote_base_url: String,

    /// Quote currency appended to every symbol (BTC -> BTC-USDT)
    #[arg(long, env = "QUOTE_CCY", default_value = "USDT")]
    pub quote_ccy: String,

    /// Per-request timeout; exceeding it leaves the symbol unpriced
    #[arg(long, env = "QUOTE_TIMEOUT_MS", default_value_t = 5_000)]
    pub quote_timeout_ms: u64,

    /// Skip price lookups (all latest prices unavailable)
    #[arg(long, env = "OFFLINE")]
    pub offline: bool,

    /// Chart feed, JSONL
    #[arg(long, env = "RECORD_FILE")]
    pub record_file: Option<PathBuf>,

    /// Prometheus textfile written at end of run
    #[arg(long, env = "METRICS_FILE")]
    pub metrics_file: Option<PathBuf>,
}

impl Args {
    pub fn quote_timeout(&self) -> Duration {
        Duration::from_millis(self.quote_timeout_ms)
    }
}

pub fn load() -> Args {
    // Pastikan .env dibaca dulu (agar FILLS_FILE, QUOTE_BASE_URL, dll ter-load)
    let _ = dotenv();
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["fill_pnl_rust", "fills.csv"]).unwrap();
        assert_eq!(args.input, PathBuf::from("fills.csv"));
        assert_eq!(args.quote_ccy, "USDT");
        assert_eq!(args.quote_timeout(), Duration::from_secs(5));
        assert!(!args.offline);
    }

    #[test]
    fn flags_override() {
        let args = Args::try_parse_from([
            "fill_pnl_rust",
            "fills.csv",
            "--output",
            "out/summary.csv",
            "--quote-ccy",
            "USDC",
            "--quote-timeout-ms",
            "250",
            "--offline",
            "--record-file",
            "chart.jsonl",
        ])
        .unwrap();
        assert_eq!(args.output, PathBuf::from("out/summary.csv"));
        assert_eq!(args.quote_ccy, "USDC");
        assert_eq!(args.quote_timeout(), Duration::from_millis(250));
        assert!(args.offline);
        assert_eq!(args.record_file, Some(PathBuf::from("chart.jsonl")));
        assert_eq!(args.metrics_file, None);
    }
}
