use serde::Serialize;

use crate::models::{
    asset::{Asset, MarketSnapshot},
    bookmark::Bookmark,
};
use crate::services::bookmarks::{BookmarkReconciler, ReconcilerState};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkEntry {
    pub bookmark: Bookmark,
    /// Current market data for the same id, if the asset is still listed
    pub live: Option<Asset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPanel {
    pub email: String,
    pub loading: bool,
    pub entries: Vec<BookmarkEntry>,
}

impl UserPanel {
    /// `None` when nobody is signed in.
    pub fn compose(snapshot: &MarketSnapshot, bookmarks: &BookmarkReconciler) -> Option<Self> {
        let email = bookmarks.session_email()?;

        let entries = bookmarks
            .bookmarks()
            .into_iter()
            .map(|bookmark| BookmarkEntry {
                live: snapshot.find_by_id(&bookmark.id).cloned(),
                bookmark,
            })
            .collect();

        Some(Self {
            email,
            loading: bookmarks.state() == ReconcilerState::Loading,
            entries,
        })
    }
}
