pub mod generator;
pub mod spread;

pub use generator::{generate_signals, SignalThresholds};
pub use spread::{compute_spread, compute_zscore, spread_table, SpreadRow};
