// ===============================
// src/domain.rs
// ===============================
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DivisionByZero, QuoteUnavailable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction { Buy, Sell }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiquidityRole { Maker, Taker, Unknown }

/// One CSV row after header cleanup and field parsing, before classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub line: u64,
    pub symbol: String,
    pub trade_time: DateTime<Utc>,
    pub filled_amount: f64,
    pub filled_price: f64,
    pub trading_volume: Option<f64>,
    pub fee: f64,
    pub liquidity_role: Option<String>,
}

/// A classified execution. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillRecord {
    pub symbol: String,
    pub trade_time: DateTime<Utc>,
    pub filled_amount: f64,
    pub filled_price: f64,
    pub trading_volume: Option<f64>,
    pub fee: f64,
    pub liquidity_role: LiquidityRole,
    pub direction: Direction,
    pub total_cost: f64,
}

/// Per-symbol aggregate. Price fields stay empty until the oracle and
/// valuation stages fill them in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSummary {
    pub symbol: String,
    pub fill_count: usize,
    pub first_trade_time: DateTime<Utc>,
    pub last_trade_time: DateTime<Utc>,
    pub total_filled_amount: f64,
    pub total_cost: f64,
    pub total_fee: f64,
    pub average_price: Result<f64, DivisionByZero>,
    pub latest_price: Option<f64>,
    pub quote_error: Option<QuoteUnavailable>,
    pub current_value: Option<f64>,
    pub pnl: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Valuation { pub current_value: Option<f64>, pub pnl: Option<f64> }

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioTotals {
    pub positions: usize,
    pub priced: usize,
    pub unpriced: usize,
    pub total_cost: f64,
    pub total_fee: f64,
    pub current_value: f64,
    pub pnl: f64,
}

/// Chart feed events (JSONL), consumed by the charting collaborator.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Fill { fill: FillRecord, cumulative_cost: f64 },
    Position { position: PositionSummary, allocation: Option<f64> },
    Totals(PortfolioTotals),
}
