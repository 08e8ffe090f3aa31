//! Bookmark Reconciler
//!
//! Keeps an in-memory copy of the active user's bookmarks in sync with the
//! backend through explicit CRUD calls. Mutations are sequential: the local
//! set changes only after the backend call succeeded, so nothing needs rolling
//! back on failure.
//!
//! Bookmarks are keyed by asset id. Callers holding a symbol go through
//! `resolve_symbol` first.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{asset::Asset, bookmark::Bookmark, session::Session};
use crate::services::backend::BackendClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerState {
    Unauthenticated,
    Loading,
    Ready,
}

struct Inner {
    session: Option<Session>,
    state: ReconcilerState,
    bookmarks: Vec<Bookmark>,
    /// Bumped on every session switch; in-flight results from an older generation are dropped
    generation: u64,
}

#[derive(Clone)]
pub struct BookmarkReconciler {
    backend: BackendClient,
    inner: Arc<RwLock<Inner>>,
}

impl BookmarkReconciler {
    pub fn new(backend: BackendClient) -> Self {
        Self {
            backend,
            inner: Arc::new(RwLock::new(Inner {
                session: None,
                state: ReconcilerState::Unauthenticated,
                bookmarks: Vec::new(),
                generation: 0,
            })),
        }
    }

    /// Scope the set to a new session. The previous user's bookmarks are discarded
    /// immediately, before anything for the new user is loaded.
    pub fn switch_session(&self, session: Option<Session>) {
        let mut inner = self.inner.write();

        let same_user = match (&inner.session, &session) {
            (Some(current), Some(next)) => current.email == next.email,
            (None, None) => true,
            _ => false,
        };
        if same_user {
            inner.session = session;
            return;
        }

        inner.generation += 1;
        inner.bookmarks.clear();
        inner.state = if session.is_some() {
            ReconcilerState::Loading
        } else {
            ReconcilerState::Unauthenticated
        };
        debug!(
            "Bookmark set reset for {}",
            session.as_ref().map(|s| s.email.as_str()).unwrap_or("<no session>")
        );
        inner.session = session;
    }

    pub fn state(&self) -> ReconcilerState {
        self.inner.read().state
    }

    pub fn session_email(&self) -> Option<String> {
        self.inner.read().session.as_ref().map(|s| s.email.clone())
    }

    pub fn bookmarks(&self) -> Vec<Bookmark> {
        self.inner.read().bookmarks.clone()
    }

    /// Fetch the authoritative list for `email`. On failure the current set is kept and
    /// the error returned; either way the reconciler ends up `Ready`.
    pub async fn load(&self, email: &str) -> Result<()> {
        let generation = {
            let mut inner = self.inner.write();
            match &inner.session {
                Some(session) if session.email == email => {}
                _ => {
                    debug!("Ignoring bookmark load for {} without matching session", email);
                    return Ok(());
                }
            }
            inner.state = ReconcilerState::Loading;
            inner.generation
        };

        let result = self.backend.fetch_bookmarks(email).await;

        let mut inner = self.inner.write();
        if inner.generation != generation {
            debug!("Session changed while loading bookmarks for {}, discarding", email);
            return Ok(());
        }
        inner.state = ReconcilerState::Ready;

        match result {
            Ok(bookmarks) => {
                info!("Loaded {} bookmarks for {}", bookmarks.len(), email);
                inner.bookmarks = bookmarks;
                Ok(())
            }
            Err(e) => {
                warn!("Error fetching bookmarks: {}", e);
                Err(e)
            }
        }
    }

    /// Reload for whoever is signed in. No-op without a session.
    pub async fn reload(&self) -> Result<()> {
        match self.session_email() {
            Some(email) => self.load(&email).await,
            None => Ok(()),
        }
    }

    pub async fn add(&self, asset: &Asset) -> Result<()> {
        let Some((email, generation)) = self.active() else {
            debug!("No session, ignoring bookmark add for {}", asset.id);
            return Ok(());
        };
        if self.is_bookmarked(&asset.id) {
            return Ok(());
        }

        self.backend.add_bookmark(&email, asset).await?;

        let mut inner = self.inner.write();
        if inner.generation == generation && !inner.bookmarks.iter().any(|b| b.id == asset.id) {
            inner.bookmarks.push(Bookmark::from(asset));
        }
        Ok(())
    }

    /// Remove by asset id. Unknown ids are a successful no-op and never reach the backend.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let Some((email, generation)) = self.active() else {
            debug!("No session, ignoring bookmark removal for {}", id);
            return Ok(());
        };
        if !self.is_bookmarked(id) {
            debug!("{} is not bookmarked, nothing to remove", id);
            return Ok(());
        }

        self.backend.remove_bookmark(&email, id).await?;

        let mut inner = self.inner.write();
        if inner.generation == generation {
            inner.bookmarks.retain(|b| b.id != id);
        }
        Ok(())
    }

    /// Add when absent, remove when present. Returns the new bookmarked state.
    pub async fn toggle(&self, asset: &Asset) -> Result<bool> {
        if self.is_bookmarked(&asset.id) {
            self.remove(&asset.id).await?;
        } else {
            self.add(asset).await?;
        }
        Ok(self.is_bookmarked(&asset.id))
    }

    pub fn is_bookmarked(&self, id: &str) -> bool {
        self.inner.read().bookmarks.iter().any(|b| b.id == id)
    }

    /// `None` while the answer is unknown: nobody signed in, or the set not loaded yet.
    pub fn bookmark_status(&self, id: &str) -> Option<bool> {
        let inner = self.inner.read();
        (inner.state == ReconcilerState::Ready).then(|| inner.bookmarks.iter().any(|b| b.id == id))
    }

    /// Map a symbol (any case) to the id of the matching bookmark.
    pub fn resolve_symbol(&self, symbol: &str) -> Option<String> {
        self.inner
            .read()
            .bookmarks
            .iter()
            .find(|b| b.symbol.eq_ignore_ascii_case(symbol))
            .map(|b| b.id.clone())
    }

    pub fn is_bookmarked_symbol(&self, symbol: &str) -> bool {
        self.resolve_symbol(symbol).is_some()
    }

    pub async fn remove_by_symbol(&self, symbol: &str) -> Result<()> {
        match self.resolve_symbol(symbol) {
            Some(id) => self.remove(&id).await,
            None => Ok(()),
        }
    }

    fn active(&self) -> Option<(String, u64)> {
        let inner = self.inner.read();
        inner
            .session
            .as_ref()
            .map(|s| (s.email.clone(), inner.generation))
    }
}
