// ===============================
// src/valuation.rs
// ===============================
use crate::domain::{PortfolioTotals, PositionSummary, Valuation};
use crate::error::QuoteUnavailable;
use crate::metrics::POSITION_PNL;

/// current_value = amount * price, pnl = current_value - cost. A missing
/// price empties both.
pub fn value(total_filled_amount: f64, total_cost: f64, latest_price: Option<f64>) -> Valuation {
    let current_value = latest_price.map(|px| total_filled_amount * px);
    Valuation { current_value, pnl: current_value.map(|v| v - total_cost) }
}

/// Attach a quote result to a summary row and mark it to market.
pub fn apply_quote(position: &mut PositionSummary, quote: Result<f64, QuoteUnavailable>) {
    let (latest_price, quote_error) = match quote {
        Ok(px) => (Some(px), None),
        Err(e) => (None, Some(e)),
    };
    let v = value(position.total_filled_amount, position.total_cost, latest_price);
    position.latest_price = latest_price;
    position.quote_error = quote_error;
    position.current_value = v.current_value;
    position.pnl = v.pnl;

    if let Some(pnl) = v.pnl {
        POSITION_PNL.with_label_values(&[&position.symbol]).set(pnl);
    }
}

pub fn totals(positions: &[PositionSummary]) -> PortfolioTotals {
    let mut t = PortfolioTotals { positions: positions.len(), ..Default::default() };
    for p in positions {
        t.total_cost += p.total_cost;
        t.total_fee += p.total_fee;
        match (p.current_value, p.pnl) {
            (Some(v), Some(pnl)) => {
                t.priced += 1;
                t.current_value += v;
                t.pnl += pnl;
            }
            _ => t.unpriced += 1,
        }
    }
    t
}

/// Share of the priced portfolio value held in `position` (pie chart slice).
pub fn allocation(position: &PositionSummary, totals: &PortfolioTotals) -> Option<f64> {
    let v = position.current_value?;
    if totals.current_value == 0.0 {
        return None;
    }
    Some(v / totals.current_value)
}
