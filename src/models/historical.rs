use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPrice {
    pub time: DateTime<Utc>,
    pub price: f64,
}

/// Hourly price points, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoricalSeries(pub Vec<HistoricalPrice>);

impl HistoricalSeries {
    pub fn points(&self) -> &[HistoricalPrice] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `(timestamp_ms, price)` pairs in the shape chart widgets consume
    pub fn chart_points(&self) -> Vec<(i64, f64)> {
        self.0
            .iter()
            .map(|p| (p.time.timestamp_millis(), p.price))
            .collect()
    }
}
