pub mod data;
pub mod error;
pub mod series;
pub mod signals;
pub mod stats;
pub mod types;

#[cfg(feature = "screening")]
pub mod cointegration;

#[cfg(feature = "backtest")]
pub mod backtest;

#[cfg(feature = "smt")]
pub mod smt;

#[cfg(all(feature = "screening", feature = "backtest"))]
pub mod pipeline;

pub use error::PairsError;
pub use series::{PricePanel, TimeSeries};
pub use types::*;

/// Standard result type for all pairs-research operations
pub type PairsResult<T> = Result<T, PairsError>;
