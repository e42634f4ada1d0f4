pub mod analytics;
pub mod engine;

pub use analytics::{summarize, BacktestSummary};
pub use engine::backtest;
