use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Closing prices and price differences. Wraps Decimal to prevent accidental f64 usage.
pub type Price = Decimal;

/// Hedge ratios (units of x per unit of y)
pub type HedgeRatio = Decimal;

/// Probabilities and significance levels expressed as decimals (0.05 = 5%)
pub type Probability = Decimal;

/// Position held on the spread `y - beta * x`.
///
/// Serializes as the signed integer -1 / 0 / +1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "i8")]
pub enum Position {
    /// Short the spread: sell y, buy beta units of x
    Short,
    #[default]
    Flat,
    /// Long the spread: buy y, sell beta units of x
    Long,
}

impl Position {
    pub fn as_i8(self) -> i8 {
        match self {
            Position::Short => -1,
            Position::Flat => 0,
            Position::Long => 1,
        }
    }

    pub fn as_decimal(self) -> Decimal {
        Decimal::from(self.as_i8())
    }

    pub fn is_flat(self) -> bool {
        self == Position::Flat
    }
}

impl From<Position> for i8 {
    fn from(p: Position) -> Self {
        p.as_i8()
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
