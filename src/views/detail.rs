use serde::Serialize;

use crate::models::{
    asset::{Asset, MarketSnapshot},
    historical::HistoricalSeries,
};
use crate::services::bookmarks::BookmarkReconciler;
use crate::services::format::{format_change, format_market_cap, format_price, format_volume};
use crate::services::history::HistoryCache;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailView {
    pub asset: Asset,
    pub price: String,
    pub change24h: String,
    pub market_cap: String,
    pub volume: String,
    pub history: HistoricalSeries,
    pub bookmarked: Option<bool>,
}

impl DetailView {
    /// Look up `symbol` (any case) in the snapshot. A missing asset is an empty state, not an error.
    pub async fn compose(
        snapshot: &MarketSnapshot,
        symbol: &str,
        history: &HistoryCache,
        bookmarks: &BookmarkReconciler,
    ) -> Option<Self> {
        let asset = snapshot.find_by_symbol(symbol)?.clone();
        let series = history.series_for(&asset).await;

        Some(Self {
            price: format!("${}", format_price(asset.price)),
            change24h: format_change(asset.change24h),
            market_cap: asset
                .market_cap
                .map(format_market_cap)
                .unwrap_or_else(|| "N/A".to_string()),
            volume: format_volume(asset.volume),
            history: series,
            bookmarked: bookmarks.bookmark_status(&asset.id),
            asset,
        })
    }
}
