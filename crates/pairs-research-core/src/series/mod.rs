pub mod math;
pub mod panel;
pub mod time_series;

pub use panel::PricePanel;
pub use time_series::TimeSeries;
