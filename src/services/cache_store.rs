use tracing::warn;

use crate::error::Result;
use crate::models::{asset::MarketSnapshot, session::Session};
use crate::services::local_store::{LocalStore, SNAPSHOT_KEY, USER_KEY};

/// Typed view over the well-known keys of the local store.
#[derive(Clone)]
pub struct CacheStore {
    store: LocalStore,
}

impl CacheStore {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Raw serialized snapshot, used for change detection
    pub fn snapshot_json(&self) -> Option<String> {
        self.store.get_item(SNAPSHOT_KEY)
    }

    pub fn snapshot(&self) -> Option<MarketSnapshot> {
        let raw = self.snapshot_json()?;
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Discarding unreadable cached snapshot: {}", e);
                None
            }
        }
    }

    pub fn write_snapshot_json(&self, serialized: &str) -> Result<()> {
        self.store.set_item(SNAPSHOT_KEY, serialized)
    }

    pub fn session(&self) -> Option<Session> {
        parse_session(self.store.get_item(USER_KEY).as_deref())
    }

    pub fn write_session(&self, session: &Session) -> Result<()> {
        let serialized = serde_json::to_string(session)?;
        self.store.set_item(USER_KEY, &serialized)
    }

    pub fn clear_session(&self) -> Result<()> {
        self.store.remove_item(USER_KEY)
    }
}

/// A stored session that fails to parse counts as logged out.
pub(crate) fn parse_session(raw: Option<&str>) -> Option<Session> {
    let raw = raw?;
    match serde_json::from_str(raw) {
        Ok(session) => Some(session),
        Err(e) => {
            warn!("Discarding unreadable stored session: {}", e);
            None
        }
    }
}
