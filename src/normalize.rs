// ===============================
// src/normalize.rs
// ===============================
//
// Row normalizer: CSV -> NormalizedRow, sorted by trade time.
//
// - Header names: every BOM removed, whitespace trimmed, then matched
//   exactly (case-sensitive) against REQUIRED_COLUMNS.
// - Bad Trade Time -> the whole batch fails (sort order is global).
// - Bad number / empty symbol -> that row is dropped and reported.
// - Trading Volume is informational: unparseable -> None, row kept.
// - Liquidity role cell is passed through as-is (only empty -> None).
//

use std::io::Read;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, warn};

use crate::domain::NormalizedRow;
use crate::error::{PipelineError, RowError, RowRejection};
use crate::metrics::ROWS_REJECTED;

pub const SYMBOL: &str = "Symbol";
pub const TRADE_TIME: &str = "Trade Time";
pub const FILLED_AMOUNT: &str = "Filled Amount";
pub const FILLED_PRICE: &str = "Filled Price";
pub const TRADING_VOLUME: &str = "Trading Volume";
pub const FEE: &str = "Fee";

pub const REQUIRED_COLUMNS: [&str; 6] =
    [SYMBOL, TRADE_TIME, FILLED_AMOUNT, FILLED_PRICE, TRADING_VOLUME, FEE];

/// Header names the optional liquidity-role column goes by in venue exports.
pub const LIQUIDITY_ROLE_COLUMNS: [&str; 6] =
    ["taker/maker", "maker/taker", "Taker/Maker", "Maker/Taker", "Liquidity Role", "Liquidity"];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

// 10 digits of seconds reach year 2286; 13-digit millis start in 2001
const EPOCH_SECONDS_MAX_DIGITS: usize = 10;

#[derive(Debug, Default)]
pub struct Normalized {
    pub rows: Vec<NormalizedRow>,
    pub rejected: Vec<RowRejection>,
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    symbol: usize,
    trade_time: usize,
    filled_amount: usize,
    filled_price: usize,
    trading_volume: usize,
    fee: usize,
    liquidity_role: Option<usize>,
}

pub fn clean_header(name: &str) -> String {
    name.replace('\u{feff}', "").trim().to_string()
}

fn resolve_columns(headers: &StringRecord) -> Result<Columns, PipelineError> {
    let names: Vec<String> = headers.iter().map(clean_header).collect();
    let find = |col: &str| names.iter().position(|n| n == col);

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| find(**c).is_none())
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::Schema { missing });
    }

    // aman: semua kolom wajib sudah dicek di atas
    let idx = |col: &str| find(col).unwrap_or_default();
    Ok(Columns {
        symbol: idx(SYMBOL),
        trade_time: idx(TRADE_TIME),
        filled_amount: idx(FILLED_AMOUNT),
        filled_price: idx(FILLED_PRICE),
        trading_volume: idx(TRADING_VOLUME),
        fee: idx(FEE),
        liquidity_role: LIQUIDITY_ROLE_COLUMNS.iter().find_map(|c| find(*c)),
    })
}

/// Parse a Trade Time cell. Naive timestamps are taken as UTC; a bare
/// integer is epoch seconds up to 10 digits, epoch milliseconds above.
pub fn parse_trade_time(value: &str) -> Option<DateTime<Utc>> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(v) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(v, "%Y-%m-%d %H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(v, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(v, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
    }
    if v.bytes().all(|b| b.is_ascii_digit()) {
        let n = v.parse::<i64>().ok()?;
        let dt = if v.len() <= EPOCH_SECONDS_MAX_DIGITS {
            Utc.timestamp_opt(n, 0)
        } else {
            Utc.timestamp_millis_opt(n)
        };
        return dt.single();
    }
    None
}

fn parse_number(field: &'static str, value: &str) -> Result<f64, RowError> {
    let v = value.trim();
    match v.parse::<f64>() {
        Ok(x) if x.is_finite() => Ok(x),
        _ => Err(RowError::InvalidNumber { field, value: v.to_string() }),
    }
}

fn parse_row(
    record: &StringRecord,
    cols: &Columns,
    line: u64,
) -> Result<Result<NormalizedRow, RowError>, PipelineError> {
    let raw_time = record.get(cols.trade_time).unwrap_or("");
    let trade_time = parse_trade_time(raw_time).ok_or_else(|| PipelineError::Parse {
        line,
        value: raw_time.to_string(),
    })?;
    Ok(build_row(record, cols, line, trade_time))
}

fn build_row(
    record: &StringRecord,
    cols: &Columns,
    line: u64,
    trade_time: DateTime<Utc>,
) -> Result<NormalizedRow, RowError> {
    let cell = |i: usize| record.get(i).unwrap_or("");

    let symbol = cell(cols.symbol).trim();
    if symbol.is_empty() {
        return Err(RowError::MissingSymbol);
    }
    let filled_amount = parse_number(FILLED_AMOUNT, cell(cols.filled_amount))?;
    let filled_price = parse_number(FILLED_PRICE, cell(cols.filled_price))?;
    if filled_price <= 0.0 {
        return Err(RowError::OutOfRange { field: FILLED_PRICE, value: filled_price, reason: "must be > 0" });
    }
    let fee = parse_number(FEE, cell(cols.fee))?;
    if fee < 0.0 {
        return Err(RowError::OutOfRange { field: FEE, value: fee, reason: "must be >= 0" });
    }
    let trading_volume = parse_number(TRADING_VOLUME, cell(cols.trading_volume)).ok();

    Ok(NormalizedRow {
        line,
        symbol: symbol.to_string(),
        trade_time,
        filled_amount,
        filled_price,
        trading_volume,
        fee,
        liquidity_role: cols
            .liquidity_role
            .map(|i| cell(i).to_string())
            .filter(|s| !s.is_empty()),
    })
}

/// Read a fill export, validate the schema, parse and sort the rows.
pub fn normalize<R: Read>(input: R) -> Result<Normalized, PipelineError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(input);
    let cols = resolve_columns(reader.headers()?)?;

    let mut out = Normalized::default();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        match parse_row(&record, &cols, line)? {
            Ok(row) => out.rows.push(row),
            Err(error) => {
                warn!(line, %error, "row rejected");
                ROWS_REJECTED.with_label_values(&[error.reason()]).inc();
                out.rejected.push(RowRejection { line, error });
            }
        }
    }

    // stable: baris dengan waktu sama tetap urut file
    out.rows.sort_by_key(|r| r.trade_time);
    debug!(rows = out.rows.len(), rejected = out.rejected.len(), "normalized");
    Ok(out)
}
