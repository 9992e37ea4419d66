// ===============================
// src/export.rs
// ===============================
//
// Summary sheet for spreadsheet apps. CSV, one row per symbol, fixed columns.
// Empty quote-dependent cells say "unavailable"; an undefined average price
// is written as #DIV/0! so the sheet shows it the way a spreadsheet would.
//

use std::io::Write;
use std::path::Path;

use crate::domain::PositionSummary;
use crate::error::PipelineError;

pub const COLUMNS: [&str; 8] = [
    "Symbol",
    "Filled Amount(sum)",
    "Total Cost(sum)",
    "Fee(sum)",
    "Average Price",
    "Latest Price",
    "Current Value",
    "PnL",
];

const UNAVAILABLE: &str = "unavailable";
const DIV_ZERO: &str = "#DIV/0!";

fn cell(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_else(|| UNAVAILABLE.to_string())
}

pub fn write_summary<W: Write>(out: W, positions: &[PositionSummary]) -> Result<(), PipelineError> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(COLUMNS)?;

    let mut rows: Vec<&PositionSummary> = positions.iter().collect();
    rows.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    for p in rows {
        w.write_record([
            p.symbol.clone(),
            p.total_filled_amount.to_string(),
            p.total_cost.to_string(),
            p.total_fee.to_string(),
            p.average_price.as_ref().map(|v| v.to_string()).unwrap_or_else(|_| DIV_ZERO.to_string()),
            cell(p.latest_price),
            cell(p.current_value),
            cell(p.pnl),
        ])?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_summary_file(path: &Path, positions: &[PositionSummary]) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)
        .map_err(|e| PipelineError::Export(format!("create {}: {e}", path.display())))?;
    write_summary(file, positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DivisionByZero, QuoteUnavailable};
    use chrono::{TimeZone, Utc};

    fn row(symbol: &str, priced: bool) -> PositionSummary {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        PositionSummary {
            symbol: symbol.into(),
            fill_count: 2,
            first_trade_time: t,
            last_trade_time: t,
            total_filled_amount: 2.0,
            total_cost: 302.0,
            total_fee: 2.0,
            average_price: Ok(151.0),
            latest_price: priced.then_some(250.0),
            quote_error: (!priced).then_some(QuoteUnavailable::Empty),
            current_value: priced.then_some(500.0),
            pnl: priced.then_some(198.0),
        }
    }

    #[test]
    fn writes_header_and_markers() {
        let mut zero = row("ETH", false);
        zero.total_filled_amount = 0.0;
        zero.average_price = Err(DivisionByZero { symbol: "ETH".into() });

        let mut buf = Vec::new();
        write_summary(&mut buf, &[zero, row("BTC", true)]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Symbol,Filled Amount(sum),Total Cost(sum),Fee(sum),Average Price,Latest Price,Current Value,PnL"
        );
        assert_eq!(lines[1], "BTC,2,302,2,151,250,500,198");
        assert_eq!(lines[2], "ETH,0,302,2,#DIV/0!,unavailable,unavailable,unavailable");
        assert_eq!(lines.len(), 3);
    }
}
