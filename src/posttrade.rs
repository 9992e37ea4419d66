// ===============================
// src/posttrade.rs (summary table -> log)
// ===============================
use tracing::{info, warn};

use crate::pipeline::RunReport;

pub fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.6}")).unwrap_or_else(|| "unavailable".to_string())
}

/// Log every summary row. Losing positions go out at warn so they stand out
/// the way a red cell would.
pub fn log_summary(report: &RunReport) {
    for r in &report.rejected {
        warn!(line = r.line, error = %r.error, "skipped row");
    }
    for p in &report.positions {
        let avg = match &p.average_price {
            Ok(v) => format!("{v:.6}"),
            Err(e) => e.to_string(),
        };
        let quote = p.quote_error.as_ref().map(|e| e.to_string()).unwrap_or_default();
        match p.pnl {
            Some(pnl) if pnl < 0.0 => warn!(
                symbol = %p.symbol, fills = p.fill_count, amount = p.total_filled_amount,
                cost = p.total_cost, fee = p.total_fee, avg_px = %avg,
                last_px = %fmt_opt(p.latest_price), value = %fmt_opt(p.current_value),
                pnl, "POSITION"
            ),
            _ => info!(
                symbol = %p.symbol, fills = p.fill_count, amount = p.total_filled_amount,
                cost = p.total_cost, fee = p.total_fee, avg_px = %avg,
                last_px = %fmt_opt(p.latest_price), value = %fmt_opt(p.current_value),
                pnl = %fmt_opt(p.pnl), quote = %quote, "POSITION"
            ),
        }
    }
    let t = &report.totals;
    info!(
        positions = t.positions, priced = t.priced, unpriced = t.unpriced,
        total_cost = t.total_cost, total_fee = t.total_fee,
        current_value = t.current_value, pnl = t.pnl, "PORTFOLIO"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_missing_values_as_unavailable() {
        assert_eq!(fmt_opt(None), "unavailable");
        assert_eq!(fmt_opt(Some(1.5)), "1.500000");
    }
}
