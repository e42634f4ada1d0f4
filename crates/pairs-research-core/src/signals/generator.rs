use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PairsError;
use crate::series::TimeSeries;
use crate::types::Position;
use crate::PairsResult;

/// Entry and exit z-score bands.
///
/// There is deliberately no `Default`: callers choose both levels
/// (common choices are 2.0 / 0.5 and 3.0 / 0.25).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalThresholds {
    /// |z| beyond this opens a position
    pub entry: Decimal,
    /// |z| inside this closes a position
    pub exit: Decimal,
}

impl SignalThresholds {
    pub fn new(entry: Decimal, exit: Decimal) -> PairsResult<Self> {
        let t = Self { entry, exit };
        t.validate()?;
        Ok(t)
    }

    /// `entry > 0` and `0 <= exit <= entry`.
    pub fn validate(&self) -> PairsResult<()> {
        if self.entry <= Decimal::ZERO {
            return Err(PairsError::InvalidInput {
                field: "entry".into(),
                reason: format!("entry threshold must be positive, got {}", self.entry),
            });
        }
        if self.exit < Decimal::ZERO || self.exit > self.entry {
            return Err(PairsError::InvalidInput {
                field: "exit".into(),
                reason: format!(
                    "exit threshold must lie in [0, {}], got {}",
                    self.entry, self.exit
                ),
            });
        }
        Ok(())
    }

    /// Next position given the current one and a defined z-score.
    pub fn step(&self, current: Position, z: Decimal) -> Position {
        if z > self.entry {
            Position::Short
        } else if z < -self.entry {
            Position::Long
        } else if z.abs() < self.exit {
            Position::Flat
        } else {
            current
        }
    }
}

/// Turn a z-score series into positions with hysteresis.
///
/// Positions start flat. Undefined z-scores keep the last position.
pub fn generate_signals(
    zscore: &TimeSeries<Option<Decimal>>,
    thresholds: &SignalThresholds,
) -> PairsResult<TimeSeries<Position>> {
    thresholds.validate()?;
    let mut position = Position::Flat;
    let signals = zscore
        .values()
        .iter()
        .map(|z| {
            if let Some(z) = z {
                position = thresholds.step(position, *z);
            }
            position
        })
        .collect();
    Ok(TimeSeries::derived(
        format!("{} signal", zscore.name()),
        zscore.index().to_vec(),
        signals,
    ))
}
