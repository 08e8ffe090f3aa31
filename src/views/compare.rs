use serde::Serialize;

use crate::models::{
    asset::{Asset, MarketSnapshot},
    comparison::Difference,
};
use crate::services::comparison::difference;
use crate::services::format::{format_market_cap, format_price};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareView {
    pub left: Asset,
    pub right: Asset,
    pub difference: Difference,
    pub price_difference: String,
    pub market_cap_difference: String,
    pub volume_difference: String,
    pub change_difference: String,
}

impl CompareView {
    /// Unselected sides default to the first and second assets of the snapshot.
    /// `None` when the snapshot is too small or an id is unknown.
    pub fn compose(
        snapshot: &MarketSnapshot,
        left_id: Option<&str>,
        right_id: Option<&str>,
    ) -> Option<Self> {
        let assets = snapshot.assets();
        if assets.len() < 2 {
            return None;
        }

        let left = match left_id {
            Some(id) => snapshot.find_by_id(id)?,
            None => &assets[0],
        };
        let right = match right_id {
            Some(id) => snapshot.find_by_id(id)?,
            None => &assets[1],
        };

        let diff = difference(left, right);
        Some(Self {
            left: left.clone(),
            right: right.clone(),
            difference: diff,
            price_difference: format!("${}", format_price(diff.price)),
            market_cap_difference: format_market_cap(diff.market_cap),
            volume_difference: format_market_cap(diff.volume),
            change_difference: format!("{:.2}%", diff.change24h),
        })
    }
}
