use serde::Serialize;

use crate::models::asset::MarketSnapshot;
use crate::services::bookmarks::BookmarkReconciler;
use crate::services::format::{format_change, format_market_cap, format_price};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRow {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub price: String,
    pub change24h: String,
    pub market_cap: String,
    /// `None` when nobody is signed in or bookmarks are still loading
    pub bookmarked: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingView {
    pub rows: Vec<ListingRow>,
}

impl ListingView {
    pub fn compose(snapshot: &MarketSnapshot, bookmarks: &BookmarkReconciler) -> Self {
        let rows = snapshot
            .assets()
            .iter()
            .map(|asset| ListingRow {
                id: asset.id.clone(),
                name: asset.name.clone(),
                symbol: asset.symbol.clone(),
                price: format!("${}", format_price(asset.price)),
                change24h: format_change(asset.change24h),
                market_cap: format_market_cap(asset.market_cap.unwrap_or(0.0)),
                bookmarked: bookmarks.bookmark_status(&asset.id),
            })
            .collect();

        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
