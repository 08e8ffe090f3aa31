use serde::{Deserialize, Serialize};

/// Absolute differences between two assets. `change24h` is in percentage points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Difference {
    pub price: f64,
    pub market_cap: f64,
    pub volume: f64,
    pub change24h: f64,
}
