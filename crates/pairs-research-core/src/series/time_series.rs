use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::PairsError;
use crate::PairsResult;

/// A named series of observations on strictly increasing, unique dates.
///
/// Derived series (spread, z-score, signal, PnL) reuse the index of the
/// series they were computed from, so alignment is checked once at the
/// boundary of every operation that combines two series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries<T = Decimal> {
    name: String,
    index: Vec<NaiveDate>,
    values: Vec<T>,
}

impl<T> TimeSeries<T> {
    /// Build a series from a date index and matching values.
    pub fn new(name: impl Into<String>, index: Vec<NaiveDate>, values: Vec<T>) -> PairsResult<Self> {
        let name = name.into();
        if index.len() != values.len() {
            return Err(PairsError::InvalidInput {
                field: name,
                reason: format!(
                    "index has {} dates but {} values were supplied",
                    index.len(),
                    values.len()
                ),
            });
        }
        if let Some(w) = index.windows(2).find(|w| w[1] <= w[0]) {
            return Err(PairsError::InvalidInput {
                field: name,
                reason: format!(
                    "timestamps must be strictly increasing, {} follows {}",
                    w[1], w[0]
                ),
            });
        }
        Ok(Self {
            name,
            index,
            values,
        })
    }

    /// Build a series from `(date, value)` points, sorting them by date first.
    /// Duplicate dates are rejected.
    pub fn from_points(name: impl Into<String>, mut points: Vec<(NaiveDate, T)>) -> PairsResult<Self> {
        points.sort_by_key(|(d, _)| *d);
        let (index, values): (Vec<NaiveDate>, Vec<T>) = points.into_iter().unzip();
        Self::new(name, index, values)
    }

    /// Internal constructor for series derived from an already validated index.
    pub(crate) fn derived(name: impl Into<String>, index: Vec<NaiveDate>, values: Vec<T>) -> Self {
        debug_assert_eq!(index.len(), values.len());
        Self {
            name: name.into(),
            index,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.index.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.index.last().copied()
    }

    /// Iterate `(date, &value)` pairs in date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &T)> + '_ {
        self.index.iter().copied().zip(self.values.iter())
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Apply `f` to every value, keeping the index.
    pub fn map<U>(&self, name: impl Into<String>, f: impl FnMut(&T) -> U) -> TimeSeries<U> {
        TimeSeries::derived(name, self.index.clone(), self.values.iter().map(f).collect())
    }

    /// Reject `other` unless it has exactly the same dates as `self`.
    ///
    /// No reindexing or filling is ever attempted.
    pub fn ensure_aligned<U>(&self, other: &TimeSeries<U>) -> PairsResult<()> {
        if self.index == other.index {
            return Ok(());
        }
        let detail = if self.len() != other.len() {
            "lengths differ".to_string()
        } else {
            let pos = self
                .index
                .iter()
                .zip(other.index.iter())
                .position(|(a, b)| a != b)
                .unwrap_or(0);
            format!(
                "first mismatch at position {}: {} vs {}",
                pos, self.index[pos], other.index[pos]
            )
        };
        Err(PairsError::MisalignedSeries {
            left: self.name.clone(),
            right: other.name.clone(),
            left_len: self.len(),
            right_len: other.len(),
            detail,
        })
    }
}

impl<T: Clone> TimeSeries<T> {
    /// Points with `start <= date < end`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let (index, values) = self
            .iter()
            .filter(|(d, _)| *d >= start && *d < end)
            .map(|(d, v)| (d, v.clone()))
            .unzip();
        Self::derived(self.name.clone(), index, values)
    }
}

impl TimeSeries<Decimal> {
    /// First differences `v[i] - v[i-1]`, indexed from the second date.
    pub fn diff(&self) -> TimeSeries<Decimal> {
        let values = self.values.windows(2).map(|w| w[1] - w[0]).collect();
        let index = self.index.iter().skip(1).copied().collect();
        TimeSeries::derived(format!("{} diff", self.name), index, values)
    }

    /// Running sum of the values.
    pub fn cumsum(&self) -> TimeSeries<Decimal> {
        let mut acc = Decimal::ZERO;
        let values = self
            .values
            .iter()
            .map(|v| {
                acc += *v;
                acc
            })
            .collect();
        TimeSeries::derived(format!("{} cumulative", self.name), self.index.clone(), values)
    }
}
