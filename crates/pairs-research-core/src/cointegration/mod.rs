pub mod engle_granger;
pub mod screener;

pub use engle_granger::{engle_granger_test, estimate_hedge_ratio, EngleGrangerResult};
pub use screener::{
    find_cointegrated_pairs, pair_indices, CointegratedPair, RejectedPair, RejectionReason,
    ScreenerConfig, ScreeningResult, SummaryRow,
};
