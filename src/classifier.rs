// ===============================
// src/classifier.rs
// ===============================
use crate::domain::{Direction, FillRecord, LiquidityRole, NormalizedRow};

impl LiquidityRole {
    /// Exact match on the venue's lowercase values. Missing, empty or any other
    /// spelling ("Maker", " maker") -> Unknown.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("maker") => LiquidityRole::Maker,
            Some("taker") => LiquidityRole::Taker,
            _ => LiquidityRole::Unknown,
        }
    }
}

/// Heuristic, not trading semantics: the export carries no side column, so a
/// maker fill is read as a buy and everything else (taker, unknown) as a sell.
pub fn direction_of(role: LiquidityRole) -> Direction {
    match role {
        LiquidityRole::Maker => Direction::Buy,
        LiquidityRole::Taker | LiquidityRole::Unknown => Direction::Sell,
    }
}

pub fn classify(row: NormalizedRow) -> FillRecord {
    let liquidity_role = LiquidityRole::parse(row.liquidity_role.as_deref());
    FillRecord {
        total_cost: row.filled_amount * row.filled_price + row.fee,
        direction: direction_of(liquidity_role),
        liquidity_role,
        symbol: row.symbol,
        trade_time: row.trade_time,
        filled_amount: row.filled_amount,
        filled_price: row.filled_price,
        trading_volume: row.trading_volume,
        fee: row.fee,
    }
}

pub fn classify_all(rows: Vec<NormalizedRow>) -> Vec<FillRecord> {
    rows.into_iter().map(classify).collect()
}
