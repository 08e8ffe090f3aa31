use crate::models::{
    asset::{Asset, MarketSnapshot},
    comparison::Difference,
};

/// Field-wise absolute differences. Missing market cap or volume counts as 0.
pub fn difference(a: &Asset, b: &Asset) -> Difference {
    Difference {
        price: (a.price - b.price).abs(),
        market_cap: (a.market_cap.unwrap_or(0.0) - b.market_cap.unwrap_or(0.0)).abs(),
        volume: (a.volume.unwrap_or(0.0) - b.volume.unwrap_or(0.0)).abs(),
        change24h: (a.change24h - b.change24h).abs(),
    }
}

/// `None` when either id is not in the snapshot.
pub fn compare_ids(snapshot: &MarketSnapshot, id_a: &str, id_b: &str) -> Option<Difference> {
    let a = snapshot.find_by_id(id_a)?;
    let b = snapshot.find_by_id(id_b)?;
    Some(difference(a, b))
}
