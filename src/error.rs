// ===============================
// src/error.rs
// ===============================
use serde::Serialize;
use thiserror::Error;

/// Fatal errors: the run stops and nothing is exported.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("CSV schema error: missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },
    #[error("parse error at line {line}: cannot parse Trade Time {value:?}")]
    Parse { line: u64, value: String },
    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("export error: {0}")]
    Export(String),
    #[error("config error: {0}")]
    Config(String),
}

/// Row-local problems. The row is dropped, the batch continues.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum RowError {
    #[error("empty Symbol")]
    MissingSymbol,
    #[error("{field} {value:?} is not a number")]
    InvalidNumber { field: &'static str, value: String },
    #[error("{field} {value} out of range ({reason})")]
    OutOfRange { field: &'static str, value: f64, reason: &'static str },
}

impl RowError {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            RowError::MissingSymbol => "missing_symbol",
            RowError::InvalidNumber { .. } => "invalid_number",
            RowError::OutOfRange { .. } => "out_of_range",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowRejection { pub line: u64, pub error: RowError }

/// Average price is undefined for a symbol that nets to zero.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("division by zero: total filled amount of {symbol} is 0")]
pub struct DivisionByZero { pub symbol: String }

/// Why a symbol has no latest price. Never leaves the pipeline as an error;
/// it is kept on the summary row next to the empty price.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum QuoteUnavailable {
    #[error("quotes disabled")]
    Disabled,
    #[error("request failed: {0}")]
    Request(String),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("no ticker data")]
    Empty,
    #[error("unusable price {0:?}")]
    InvalidPrice(String),
}

impl QuoteUnavailable {
    pub fn outcome(&self) -> &'static str {
        match self {
            QuoteUnavailable::Disabled => "disabled",
            QuoteUnavailable::Request(_) => "request_error",
            QuoteUnavailable::Status(_) => "bad_status",
            QuoteUnavailable::Malformed(_) => "malformed",
            QuoteUnavailable::Empty => "empty",
            QuoteUnavailable::InvalidPrice(_) => "invalid_price",
        }
    }
}
