use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::TimeSeries;
use crate::error::PairsError;
use crate::PairsResult;

/// Closing prices for several instruments on a common date index.
///
/// Every row is complete: dates where any instrument lacks a price are
/// dropped when the panel is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePanel {
    symbols: Vec<String>,
    index: Vec<NaiveDate>,
    columns: Vec<Vec<Decimal>>,
}

impl PricePanel {
    /// Inner-join the series on date. Column order follows the input order.
    pub fn merge(series: &[TimeSeries]) -> PairsResult<Self> {
        if series.is_empty() {
            return Err(PairsError::InsufficientData(
                "At least one price series is required to build a panel".into(),
            ));
        }

        let mut seen = HashSet::new();
        for s in series {
            if !seen.insert(s.name()) {
                return Err(PairsError::InvalidInput {
                    field: "symbols".into(),
                    reason: format!("duplicate symbol '{}'", s.name()),
                });
            }
            if s.is_empty() {
                return Err(PairsError::DataUnavailable {
                    symbol: s.name().to_string(),
                    reason: "series is empty".into(),
                });
            }
        }

        // date -> one slot per symbol
        let mut rows: BTreeMap<NaiveDate, Vec<Option<Decimal>>> = BTreeMap::new();
        for (col, s) in series.iter().enumerate() {
            for (date, value) in s.iter() {
                rows.entry(date).or_insert_with(|| vec![None; series.len()])[col] = Some(*value);
            }
        }

        let mut index = Vec::with_capacity(rows.len());
        let mut columns = vec![Vec::with_capacity(rows.len()); series.len()];
        for (date, row) in rows {
            if row.iter().any(Option::is_none) {
                continue;
            }
            index.push(date);
            for (col, value) in row.into_iter().flatten().enumerate() {
                columns[col].push(value);
            }
        }

        Ok(Self {
            symbols: series.iter().map(|s| s.name().to_string()).collect(),
            index,
            columns,
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    /// Number of rows (dates).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn position_of(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// Prices of the column at `position`.
    pub fn column_values(&self, position: usize) -> Option<&[Decimal]> {
        self.columns.get(position).map(Vec::as_slice)
    }

    /// The named column as a series on the panel index.
    pub fn series(&self, symbol: &str) -> PairsResult<TimeSeries> {
        let pos = self.position_of(symbol).ok_or_else(|| PairsError::InvalidInput {
            field: "symbol".into(),
            reason: format!(
                "'{}' is not in the panel (available: {})",
                symbol,
                self.symbols.join(", ")
            ),
        })?;
        Ok(TimeSeries::derived(
            symbol,
            self.index.clone(),
            self.columns[pos].clone(),
        ))
    }

    /// Rows as `(date, prices in column order)`.
    pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, Vec<Decimal>)> + '_ {
        self.index
            .iter()
            .enumerate()
            .map(move |(i, d)| (*d, self.columns.iter().map(|c| c[i]).collect()))
    }
}
