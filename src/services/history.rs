//! Synthesized price history
//!
//! The backend supplies no history, so detail views get a 24-point hourly
//! random walk around the current price. A series is generated once per asset
//! and cached for the life of the process so re-renders show the same chart.

use chrono::{DateTime, Duration, Utc};
use moka::future::Cache;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::debug;

use crate::models::{
    asset::Asset,
    historical::{HistoricalPrice, HistoricalSeries},
};

pub const SERIES_LEN: usize = 24;
const JITTER: f64 = 0.1;

/// Oldest first; point `i` from the end sits `i` hours before `now`.
pub fn synthesize_series<R: Rng + ?Sized>(
    base_price: f64,
    now: DateTime<Utc>,
    rng: &mut R,
) -> HistoricalSeries {
    let mut points = Vec::with_capacity(SERIES_LEN);

    for i in 0..SERIES_LEN {
        let time = now - Duration::hours(i as i64);
        let noise = rng.random_range(-0.5_f64..0.5) * JITTER;
        let price = ((base_price + noise) * 1000.0).round() / 1000.0;
        points.push(HistoricalPrice { time, price });
    }

    points.reverse();
    HistoricalSeries(points)
}

#[derive(Clone)]
pub struct HistoryCache {
    cache: Cache<String, HistoricalSeries>,
    rng: Arc<Mutex<StdRng>>,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Deterministic series, for tests and reproducible output
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            cache: Cache::builder().max_capacity(1000).build(),
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    /// The cached series for `asset.id`, generating it around the current price on first use.
    pub async fn series_for(&self, asset: &Asset) -> HistoricalSeries {
        let rng = self.rng.clone();
        let base_price = asset.price;
        let id = asset.id.clone();

        self.cache
            .get_with(asset.id.clone(), async move {
                debug!("Synthesizing price history for {}", id);
                let mut rng = rng.lock();
                synthesize_series(base_price, Utc::now(), &mut *rng)
            })
            .await
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.cache.get(id).await.is_some()
    }
}

impl Default for HistoryCache {
    fn default() -> Self {
        Self::new()
    }
}
