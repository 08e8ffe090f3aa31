//! Market Poller
//!
//! Fetches the full market snapshot on a fixed interval. The cached snapshot
//! is replaced only when the serialized form of the new one differs from the
//! previous one, so unchanged polls cause no store write and no notification.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::jobs::supervisor::{ScopedTask, SingleSlot};
use crate::models::asset::MarketSnapshot;
use crate::services::backend::BackendClient;
use crate::services::cache_store::CacheStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Snapshot replaced; carries the number of assets
    Updated(usize),
    Unchanged,
    /// Another fetch was still in flight
    Skipped,
    /// Fetch failed, previous snapshot kept
    Failed,
}

struct PollerInner {
    backend: BackendClient,
    cache: CacheStore,
    slot: SingleSlot,
    last_serialized: Mutex<Option<String>>,
    snapshot: watch::Sender<MarketSnapshot>,
}

#[derive(Clone)]
pub struct MarketPoller {
    inner: Arc<PollerInner>,
}

impl MarketPoller {
    /// Seeds the in-memory snapshot from the cache so views have data before the first poll.
    pub fn new(backend: BackendClient, cache: CacheStore) -> Self {
        let last_serialized = cache.snapshot_json();
        let initial = cache.snapshot().unwrap_or_default();
        let (snapshot, _) = watch::channel(initial);

        Self {
            inner: Arc::new(PollerInner {
                backend,
                cache,
                slot: SingleSlot::new(),
                last_serialized: Mutex::new(last_serialized),
                snapshot,
            }),
        }
    }

    pub fn snapshot(&self) -> MarketSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Receiver that is marked changed only when a poll replaced the snapshot.
    pub fn subscribe(&self) -> watch::Receiver<MarketSnapshot> {
        self.inner.snapshot.subscribe()
    }

    pub fn is_fetching(&self) -> bool {
        self.inner.slot.is_busy()
    }

    /// One poll. Never returns an error: failures are logged and the old snapshot stays.
    pub async fn poll_once(&self) -> PollOutcome {
        match self.inner.slot.run_if_idle(self.refresh()).await {
            Some(outcome) => outcome,
            None => {
                debug!("Market fetch still in flight, dropping this poll");
                PollOutcome::Skipped
            }
        }
    }

    async fn refresh(&self) -> PollOutcome {
        let snapshot = match self.inner.backend.fetch_market().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Error fetching market data: {}", e);
                return PollOutcome::Failed;
            }
        };

        let serialized = match serde_json::to_string(&snapshot) {
            Ok(serialized) => serialized,
            Err(e) => {
                error!("Failed to serialize market snapshot: {}", e);
                return PollOutcome::Failed;
            }
        };

        {
            let mut last = self.inner.last_serialized.lock();
            if last.as_deref() == Some(serialized.as_str()) {
                debug!("Market snapshot unchanged ({} assets)", snapshot.len());
                return PollOutcome::Unchanged;
            }
            *last = Some(serialized.clone());
        }

        if let Err(e) = self.inner.cache.write_snapshot_json(&serialized) {
            warn!("Failed to persist market snapshot: {}", e);
        }

        let count = snapshot.len();
        self.inner.snapshot.send_replace(snapshot);
        info!("Market snapshot updated ({} assets)", count);

        PollOutcome::Updated(count)
    }

    /// Poll now and then every `every`. Polling stops when the handle is stopped or dropped.
    pub fn start(&self, every: Duration) -> PollerHandle {
        let poller = self.clone();
        let every = every.max(Duration::from_millis(1));

        let task = ScopedTask::spawn(async move {
            info!("Starting market polling (every {:?})", every);
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                // First tick completes immediately
                ticker.tick().await;
                poller.poll_once().await;
            }
        });

        PollerHandle { task }
    }
}

/// Running poll loop. Dropping it cancels polling.
#[derive(Debug)]
pub struct PollerHandle {
    task: ScopedTask,
}

impl PollerHandle {
    pub fn stop(&mut self) {
        if self.task.is_running() {
            info!("Stopping market polling");
        }
        self.task.stop();
    }

    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }
}
