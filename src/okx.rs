// ===============================
// src/okx.rs
// ===============================
use serde::Deserialize;
use serde_json::Value;

use crate::error::QuoteUnavailable;

pub const TICKER_PATH: &str = "/api/v5/market/ticker";

/// Venue markers that are not part of the spot instrument id.
pub const VENUE_SUFFIXES: [&str; 3] = ["-SWAP", "-PERP", "-FUTURES"];

/// `BTC` / `btc-swap` / `BTC-USDT-SWAP` -> `BTC-USDT`. Idempotent.
pub fn inst_id(symbol: &str, quote_ccy: &str) -> String {
    let mut s = symbol.trim().to_ascii_uppercase();
    for suffix in VENUE_SUFFIXES {
        if let Some(stripped) = s.strip_suffix(suffix) {
            s = stripped.to_string();
        }
    }
    let pair = format!("-{}", quote_ccy.trim().to_ascii_uppercase());
    if s.ends_with(&pair) { s } else { format!("{s}{pair}") }
}

// ---- Minimal ticker models ----
#[derive(Debug, Deserialize)]
pub struct TickerResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<Ticker>>,
}

#[derive(Debug, Deserialize)]
pub struct Ticker {
    #[serde(rename = "instId", default)]
    pub inst_id: Option<String>,
    #[serde(default)]
    pub last: Option<Value>, // "43000.1" (string di OKX), angka juga diterima
}

/// `data[0].last` as a positive finite price.
pub fn parse_ticker(body: &str) -> Result<f64, QuoteUnavailable> {
    let rsp: TickerResponse =
        serde_json::from_str(body).map_err(|e| QuoteUnavailable::Malformed(e.to_string()))?;

    let Some(first) = rsp.data.as_ref().and_then(|d| d.first()) else {
        tracing::debug!(code = ?rsp.code, msg = ?rsp.msg, "ticker response without data");
        return Err(QuoteUnavailable::Empty);
    };

    tracing::trace!(inst_id = ?first.inst_id, last = ?first.last, "ticker");
    let px = match &first.last {
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    };
    match px {
        Some(p) if p.is_finite() && p > 0.0 => Ok(p),
        _ => Err(QuoteUnavailable::InvalidPrice(
            first.last.as_ref().map(|v| v.to_string()).unwrap_or_default(),
        )),
    }
}
