pub mod adf;
pub mod mackinnon;
pub mod ols;

pub use adf::{adf_test, AdfTestResult, Deterministic};
pub use mackinnon::CriticalValues;
pub use ols::OlsFit;
