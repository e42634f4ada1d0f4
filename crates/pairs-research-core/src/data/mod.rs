//! Boundary to wherever closing prices come from.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::PairsError;
use crate::series::{PricePanel, TimeSeries};
use crate::PairsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Supplies daily closing prices for one instrument.
pub trait PriceSource {
    /// Closes for `symbol` on `start <= date < end`.
    ///
    /// An unknown symbol or a range with no prices is reported as
    /// [`PairsError::DataUnavailable`].
    fn fetch_closes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> PairsResult<TimeSeries>;
}

/// A symbol that was requested but could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnavailableSymbol {
    pub symbol: String,
    pub reason: String,
}

/// Result of [`load_panel`]: the merged panel plus the symbols left out of it.
#[derive(Debug, Clone, Serialize)]
pub struct PanelLoad {
    pub panel: PricePanel,
    pub unavailable: Vec<UnavailableSymbol>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Fetch every symbol and inner-join the results on date.
///
/// A symbol that fails to load is logged and skipped; the call only fails
/// when no symbol loads at all.
pub fn load_panel<S: PriceSource + ?Sized>(
    source: &S,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> PairsResult<PanelLoad> {
    if symbols.is_empty() {
        return Err(PairsError::InvalidInput {
            field: "symbols".into(),
            reason: "at least one symbol is required".into(),
        });
    }
    if start >= end {
        return Err(PairsError::InvalidInput {
            field: "end".into(),
            reason: format!("end date {} must be after start date {}", end, start),
        });
    }

    let mut loaded = Vec::with_capacity(symbols.len());
    let mut unavailable = Vec::new();
    for symbol in symbols {
        let fetched = source.fetch_closes(symbol, start, end).and_then(|s| {
            if s.is_empty() {
                Err(PairsError::DataUnavailable {
                    symbol: symbol.clone(),
                    reason: format!("no prices between {} and {}", start, end),
                })
            } else {
                Ok(s.with_name(symbol.as_str()))
            }
        });
        match fetched {
            Ok(series) => loaded.push(series),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "skipping symbol");
                unavailable.push(UnavailableSymbol {
                    symbol: symbol.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if loaded.is_empty() {
        return Err(PairsError::InsufficientData(format!(
            "none of the {} requested symbols could be loaded",
            symbols.len()
        )));
    }

    let panel = PricePanel::merge(&loaded)?;
    info!(
        symbols = panel.symbols().len(),
        rows = panel.len(),
        skipped = unavailable.len(),
        "price panel loaded"
    );
    Ok(PanelLoad { panel, unavailable })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::collections::HashMap;

    struct MemorySource {
        closes: HashMap<String, Vec<(NaiveDate, Decimal)>>,
    }

    impl PriceSource for MemorySource {
        fn fetch_closes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> PairsResult<TimeSeries> {
            let points = self
                .closes
                .get(symbol)
                .ok_or_else(|| PairsError::DataUnavailable {
                    symbol: symbol.to_string(),
                    reason: "unknown symbol".into(),
                })?;
            Ok(TimeSeries::from_points("raw", points.clone())?.between(start, end))
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn source() -> MemorySource {
        let mut closes = HashMap::new();
        closes.insert(
            "ES=F".to_string(),
            (1..=5).map(|d| (day(d), Decimal::from(100 + d))).collect(),
        );
        closes.insert(
            "NQ=F".to_string(),
            [1, 2, 4, 5].iter().map(|d| (day(*d), Decimal::from(50 + d))).collect(),
        );
        closes.insert("YM=F".to_string(), Vec::new());
        MemorySource { closes }
    }

    fn symbols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_load_inner_joins_available_symbols() {
        let load = load_panel(&source(), &symbols(&["ES=F", "NQ=F", "YM=F", "RTY=F"]), day(1), day(6))
            .unwrap();
        assert_eq!(load.panel.symbols(), &["ES=F".to_string(), "NQ=F".to_string()]);
        assert_eq!(load.panel.index(), &[day(1), day(2), day(4), day(5)]);
        let skipped: Vec<&str> = load.unavailable.iter().map(|u| u.symbol.as_str()).collect();
        assert_eq!(skipped, vec!["YM=F", "RTY=F"]);
    }

    #[test]
    fn test_end_date_is_exclusive() {
        let load = load_panel(&source(), &symbols(&["ES=F"]), day(2), day(4)).unwrap();
        assert_eq!(load.panel.index(), &[day(2), day(3)]);
    }

    #[test]
    fn test_nothing_loaded_is_error() {
        let err = load_panel(&source(), &symbols(&["YM=F", "CL=F"]), day(1), day(6)).unwrap_err();
        assert!(matches!(err, PairsError::InsufficientData(_)));
    }

    #[test]
    fn test_invalid_range_rejected() {
        assert!(load_panel(&source(), &symbols(&["ES=F"]), day(5), day(5)).is_err());
        assert!(load_panel(&source(), &[], day(1), day(5)).is_err());
    }
}
