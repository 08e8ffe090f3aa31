use serde::{Deserialize, Serialize};

use super::asset::Asset;

/// Denormalized copy of an asset taken at bookmark time. Not refreshed when prices move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub change24h: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default)]
    pub image_url: String,
}

impl From<&Asset> for Bookmark {
    fn from(asset: &Asset) -> Self {
        Self {
            id: asset.id.clone(),
            name: asset.name.clone(),
            symbol: asset.symbol.clone(),
            price: asset.price,
            change24h: asset.change24h,
            market_cap: asset.market_cap,
            volume: asset.volume,
            image_url: asset.image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookmarksResponse {
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddBookmarkRequest<'a> {
    pub email: &'a str,
    pub crypto: &'a Asset,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveBookmarkRequest<'a> {
    pub email: &'a str,
    pub crypto_id: &'a str,
}
