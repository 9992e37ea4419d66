// ===============================
// src/positions.rs (per-symbol aggregation)
// ===============================

use ahash::AHashMap as HashMap;
use chrono::{DateTime, Utc};

use crate::domain::{FillRecord, PositionSummary};
use crate::error::DivisionByZero;
use crate::metrics::{FILLS, POSITIONS};

#[derive(Debug, Clone)]
struct SymbolState {
    fill_count: usize,
    first_trade_time: DateTime<Utc>,
    last_trade_time: DateTime<Utc>,
    total_filled_amount: f64,
    total_cost: f64,
    total_fee: f64,
}

impl SymbolState {
    fn new(fill: &FillRecord) -> Self {
        Self {
            fill_count: 0,
            first_trade_time: fill.trade_time,
            last_trade_time: fill.trade_time,
            total_filled_amount: 0.0,
            total_cost: 0.0,
            total_fee: 0.0,
        }
    }

    fn on_fill(&mut self, fill: &FillRecord) {
        self.fill_count += 1;
        self.first_trade_time = self.first_trade_time.min(fill.trade_time);
        self.last_trade_time = self.last_trade_time.max(fill.trade_time);
        self.total_filled_amount += fill.filled_amount;
        self.total_cost += fill.total_cost;
        self.total_fee += fill.fee;
    }

    fn into_summary(self, symbol: String) -> PositionSummary {
        PositionSummary {
            average_price: average_price(&symbol, self.total_cost, self.total_filled_amount),
            symbol,
            fill_count: self.fill_count,
            first_trade_time: self.first_trade_time,
            last_trade_time: self.last_trade_time,
            total_filled_amount: self.total_filled_amount,
            total_cost: self.total_cost,
            total_fee: self.total_fee,
            latest_price: None,
            quote_error: None,
            current_value: None,
            pnl: None,
        }
    }
}

/// Cost basis per unit, fees included. Undefined when the symbol nets to zero.
pub fn average_price(symbol: &str, total_cost: f64, total_filled_amount: f64) -> Result<f64, DivisionByZero> {
    if total_filled_amount == 0.0 {
        return Err(DivisionByZero { symbol: symbol.to_string() });
    }
    Ok(total_cost / total_filled_amount)
}

/// One summary per distinct symbol. Rows come back sorted by symbol; callers
/// should not depend on that.
pub fn aggregate(fills: &[FillRecord]) -> Vec<PositionSummary> {
    let mut by_symbol: HashMap<&str, SymbolState> = HashMap::new();
    for fill in fills {
        by_symbol
            .entry(fill.symbol.as_str())
            .or_insert_with(|| SymbolState::new(fill))
            .on_fill(fill);
    }

    let mut out: Vec<PositionSummary> = by_symbol
        .into_iter()
        .map(|(symbol, state)| state.into_summary(symbol.to_string()))
        .collect();
    out.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    for p in &out {
        if let Err(e) = &p.average_price {
            tracing::warn!(symbol = %p.symbol, error = %e, "average price undefined");
        }
    }
    FILLS.inc_by(fills.len() as u64);
    POSITIONS.set(out.len() as i64);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, LiquidityRole};
    use approx::assert_relative_eq;
    use chrono::TimeZone;
    use std::collections::BTreeSet;

    fn fill(symbol: &str, day: u32, amount: f64, price: f64, fee: f64) -> FillRecord {
        FillRecord {
            symbol: symbol.into(),
            trade_time: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            filled_amount: amount,
            filled_price: price,
            trading_volume: None,
            fee,
            liquidity_role: LiquidityRole::Unknown,
            direction: Direction::Sell,
            total_cost: amount * price + fee,
        }
    }

    #[test]
    fn btc_example() {
        let out = aggregate(&[fill("BTC", 1, 1.0, 100.0, 1.0), fill("BTC", 2, 1.0, 200.0, 1.0)]);
        assert_eq!(out.len(), 1);
        let p = &out[0];
        assert_eq!(p.symbol, "BTC");
        assert_eq!(p.fill_count, 2);
        assert_relative_eq!(p.total_filled_amount, 2.0);
        assert_relative_eq!(p.total_cost, 302.0);
        assert_relative_eq!(p.total_fee, 2.0);
        assert_relative_eq!(*p.average_price.as_ref().unwrap(), 151.0);
        assert_eq!(p.latest_price, None);
        assert_eq!(p.first_trade_time, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(p.last_trade_time, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn symbols_match_input_and_cost_reconstructs() {
        let fills = vec![
            fill("ETH", 1, 0.3, 2_000.0, 0.12),
            fill("BTC", 2, 0.01, 40_000.0, 0.4),
            fill("ETH", 3, 1.7, 2_150.5, 0.9),
            fill("SOL-SWAP", 4, 12.0, 95.25, 0.0),
            fill("BTC", 5, 0.02, 41_234.5, 0.8),
        ];
        let out = aggregate(&fills);

        let want: BTreeSet<&str> = fills.iter().map(|f| f.symbol.as_str()).collect();
        let got: BTreeSet<&str> = out.iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(got, want);

        for p in &out {
            let expected: f64 = fills
                .iter()
                .filter(|f| f.symbol == p.symbol)
                .map(|f| f.filled_amount * f.filled_price + f.fee)
                .sum();
            assert_relative_eq!(p.total_cost, expected, max_relative = 1e-12);
            let avg = p.average_price.as_ref().unwrap();
            assert_relative_eq!(avg * p.total_filled_amount, p.total_cost, max_relative = 1e-12);
        }
    }

    #[test]
    fn zero_amount_only_breaks_its_own_row() {
        let out = aggregate(&[
            fill("BTC", 1, 1.0, 100.0, 1.0),
            fill("BTC", 2, -1.0, 120.0, 1.0),
            fill("ETH", 3, 2.0, 10.0, 0.0),
        ]);
        let btc = out.iter().find(|p| p.symbol == "BTC").unwrap();
        assert_eq!(btc.average_price, Err(DivisionByZero { symbol: "BTC".into() }));
        assert_relative_eq!(btc.total_cost, -18.0);

        let eth = out.iter().find(|p| p.symbol == "ETH").unwrap();
        assert_eq!(eth.average_price, Ok(10.0));
    }

    #[test]
    fn no_fills_no_rows() {
        assert!(aggregate(&[]).is_empty());
    }
}
