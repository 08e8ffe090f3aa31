// src/lib.rs

use std::sync::Arc;

use config::Config;
use error::Result;
use jobs::market_poll::MarketPoller;
use services::{
    backend::BackendClient, bookmarks::BookmarkReconciler, cache_store::CacheStore,
    history::HistoryCache, local_store::LocalStore, session::SessionManager,
};

/// Everything a view needs, wired once per process.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub backend: BackendClient,
    pub cache: CacheStore,
    pub session: SessionManager,
    pub poller: MarketPoller,
    pub bookmarks: BookmarkReconciler,
    pub history: HistoryCache,
}

impl AppState {
    /// Open the persisted store under `config.data_dir` and build the services on top of it.
    pub fn open(config: Config) -> Result<Self> {
        let store = LocalStore::open(&config.data_dir)?;
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: LocalStore) -> Self {
        let backend = BackendClient::new(config.api_url.clone());
        let cache = CacheStore::new(store);
        let session = SessionManager::new(Arc::new(backend.clone()), cache.clone());
        let poller = MarketPoller::new(backend.clone(), cache.clone());
        let bookmarks = BookmarkReconciler::new(backend.clone());
        bookmarks.switch_session(session.current());

        Self {
            config,
            backend,
            cache,
            session,
            poller,
            bookmarks,
            history: HistoryCache::new(),
        }
    }
}

pub mod config;
pub mod error;

pub mod services {
    pub mod auth;
    pub mod backend;
    pub mod bookmarks;
    pub mod cache_store;
    pub mod comparison;
    pub mod format;
    pub mod history;
    pub mod local_store;
    pub mod session;
}

pub mod jobs;
pub mod models;
pub mod views;
