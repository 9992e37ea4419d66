// ===============================
// src/pipeline.rs
// ===============================
//
// normalize -> classify -> aggregate -> quote -> value
//
// Only a schema error, a bad Trade Time, or a broken input stream stops the
// run. Everything else stays local to its row or symbol.
//

use std::io::Read;

use ahash::AHashMap as HashMap;
use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::classifier::classify_all;
use crate::domain::{FillRecord, PortfolioTotals, PositionSummary};
use crate::error::{PipelineError, QuoteUnavailable, RowRejection};
use crate::metrics::QUOTES;
use crate::normalize::normalize;
use crate::oracle::PriceSource;
use crate::positions::aggregate;
use crate::valuation::{apply_quote, totals};

#[derive(Debug)]
pub struct RunReport {
    /// Classified fills in trade-time order.
    pub fills: Vec<FillRecord>,
    pub rejected: Vec<RowRejection>,
    pub positions: Vec<PositionSummary>,
    pub totals: PortfolioTotals,
}

pub async fn run<R: Read, P: PriceSource>(input: R, source: &P) -> Result<RunReport, PipelineError> {
    let normalized = normalize(input)?;
    let fills = classify_all(normalized.rows);
    info!(fills = fills.len(), rejected = normalized.rejected.len(), "fills loaded");

    let mut positions = aggregate(&fills);
    price_positions(&mut positions, source).await;
    let totals = totals(&positions);

    Ok(RunReport { fills, rejected: normalized.rejected, positions, totals })
}

/// One request per distinct instrument, all in flight together, joined
/// before any row is valued.
pub async fn price_positions<P: PriceSource>(positions: &mut [PositionSummary], source: &P) {
    let keys: Vec<String> = positions.iter().map(|p| source.instrument(&p.symbol)).collect();
    let mut unique: Vec<&str> = keys.iter().map(String::as_str).collect();
    unique.sort_unstable();
    unique.dedup();

    debug!(instruments = ?unique, "requesting quotes");
    let quotes = join_all(unique.iter().map(|inst| source.latest_price(inst))).await;
    for q in &quotes {
        let outcome = match q {
            Ok(_) => "ok",
            Err(e) => e.outcome(),
        };
        QUOTES.with_label_values(&[outcome]).inc();
    }
    let by_inst: HashMap<&str, Result<f64, QuoteUnavailable>> = unique.into_iter().zip(quotes).collect();

    for (position, key) in positions.iter_mut().zip(&keys) {
        let quote = by_inst.get(key.as_str()).cloned().unwrap_or(Err(QuoteUnavailable::Empty));
        match &quote {
            Ok(px) => debug!(symbol = %position.symbol, instrument = %key, px, "latest price"),
            Err(e) => warn!(symbol = %position.symbol, instrument = %key, reason = %e, "latest price unavailable"),
        }
        apply_quote(position, quote);
    }
}
