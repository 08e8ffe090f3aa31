//! Local key/value store
//!
//! String keys to string values, shared by every handle ("tab") of the
//! application and optionally persisted to `storage.json`. Mutations are
//! announced to the *other* handles, the same way a browser fires `storage`
//! events only in tabs that did not make the change.
//!
//! A file-backed store is also shared with other processes opened on the same
//! directory. Writes re-read the file under an exclusive lock and change only
//! their own key, and a background task re-reads the file so changes made by
//! another process show up here as events.

use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::Result;

pub const USER_KEY: &str = "user";
pub const SNAPSHOT_KEY: &str = "cryptoData";

/// How often a file-backed store looks for writes made by other processes
pub const DISK_SYNC_INTERVAL: Duration = Duration::from_millis(250);

const STORAGE_FILE: &str = "storage.json";

/// Origin of events caused by another process; never equal to a handle's origin
const EXTERNAL_ORIGIN: u64 = u64::MAX;

type Items = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    origin: u64,
}

struct Shared {
    items: RwLock<Items>,
    path: Option<PathBuf>,
    /// Serializes writers within this process; the file lock covers other processes
    write_lock: Mutex<()>,
    events: broadcast::Sender<StorageEvent>,
    next_origin: AtomicU64,
}

impl Shared {
    /// Pick up writes made by other processes. Every key that differs from
    /// memory is announced to all handles.
    fn sync_from_disk(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let _write = self.write_lock.lock();

        let Some(on_disk) = read_items(path)? else {
            return Ok(());
        };
        let previous = {
            let mut items = self.items.write();
            if *items == on_disk {
                return Ok(());
            }
            std::mem::replace(&mut *items, on_disk)
        };

        debug!("Store at {} changed on disk", path.display());
        self.announce(&previous, None);
        Ok(())
    }

    /// Emit one event per key that differs between `previous` and the current map.
    /// `written` names the key changed through a handle, with that handle's origin.
    fn announce(&self, previous: &Items, written: Option<(&str, u64)>) {
        let current = self.items.read();
        let keys: HashSet<&String> = previous.keys().chain(current.keys()).collect();

        for key in keys {
            let old_value = previous.get(key);
            let new_value = current.get(key);
            if old_value == new_value {
                continue;
            }
            let origin = match written {
                Some((written_key, origin)) if written_key == key.as_str() => origin,
                _ => EXTERNAL_ORIGIN,
            };
            // No receivers is fine
            let _ = self.events.send(StorageEvent {
                key: key.clone(),
                old_value: old_value.cloned(),
                new_value: new_value.cloned(),
                origin,
            });
        }
    }
}

/// Handle onto the shared store. Clones stay in the same tab; `tab()` opens a new one.
#[derive(Clone)]
pub struct LocalStore {
    shared: Arc<Shared>,
    origin: u64,
}

impl LocalStore {
    pub fn in_memory() -> Self {
        Self::from_parts(HashMap::new(), None)
    }

    /// Open (or create) the store persisted under `dir`. Inside a tokio runtime
    /// this also starts following writes made by other processes.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(STORAGE_FILE);

        let items = read_items(&path)?.unwrap_or_default();
        debug!("Opened store at {} ({} keys)", path.display(), items.len());

        let store = Self::from_parts(items, Some(path));
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(follow_disk(Arc::downgrade(&store.shared)));
        }
        Ok(store)
    }

    fn from_parts(items: Items, path: Option<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            shared: Arc::new(Shared {
                items: RwLock::new(items),
                path,
                write_lock: Mutex::new(()),
                events,
                next_origin: AtomicU64::new(1),
            }),
            origin: 0,
        }
    }

    /// Another handle onto the same storage, with its own event origin.
    pub fn tab(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            origin: self.shared.next_origin.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.shared.items.read().get(key).cloned()
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.mutate(key, Some(value.to_string()))
    }

    pub fn remove_item(&self, key: &str) -> Result<()> {
        self.mutate(key, None)
    }

    /// Re-read the backing file now instead of waiting for the next sync tick.
    pub fn sync(&self) -> Result<()> {
        self.shared.sync_from_disk()
    }

    /// Events for mutations made through other handles or other processes.
    pub fn subscribe(&self) -> StorageSubscription {
        StorageSubscription {
            rx: self.shared.events.subscribe(),
            origin: self.origin,
        }
    }

    /// Memory only changes once the file write went through.
    fn mutate(&self, key: &str, value: Option<String>) -> Result<()> {
        let shared = &self.shared;
        let _write = shared.write_lock.lock();

        let mut next = match &shared.path {
            Some(path) => {
                let _file = lock_file(path)?;
                let mut on_disk = match read_items(path)? {
                    Some(items) => items,
                    None => shared.items.read().clone(),
                };
                if apply(&mut on_disk, key, value.clone()) != value {
                    persist(path, &serde_json::to_string(&on_disk)?)?;
                }
                on_disk
            }
            None => shared.items.read().clone(),
        };
        apply(&mut next, key, value);

        let previous = std::mem::replace(&mut *shared.items.write(), next);
        shared.announce(&previous, Some((key, self.origin)));
        Ok(())
    }
}

/// Returns the previous value under `key`.
fn apply(items: &mut Items, key: &str, value: Option<String>) -> Option<String> {
    match value {
        Some(v) => items.insert(key.to_string(), v),
        None => items.remove(key),
    }
}

/// `None` when the file exists but does not parse.
fn read_items(path: &Path) -> Result<Option<Items>> {
    match fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str::<Items>(&raw) {
            Ok(items) => Ok(Some(items)),
            Err(e) => {
                warn!("Ignoring corrupt store at {}: {}", path.display(), e);
                Ok(None)
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Some(HashMap::new())),
        Err(e) => Err(e.into()),
    }
}

/// Exclusive lock shared by every process writing under the same directory.
/// Released when the returned file is dropped.
fn lock_file(path: &Path) -> Result<File> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path.with_extension("json.lock"))?;
    file.lock()?;
    Ok(file)
}

fn persist(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Runs until the store is dropped.
async fn follow_disk(shared: Weak<Shared>) {
    let mut ticker = interval(DISK_SYNC_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };
        if let Err(e) = shared.sync_from_disk() {
            warn!("Failed to re-read local store: {}", e);
        }
    }
}

pub struct StorageSubscription {
    rx: broadcast::Receiver<StorageEvent>,
    origin: u64,
}

impl StorageSubscription {
    /// Next foreign event. `None` once every store handle is gone.
    pub async fn recv(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.origin == self.origin => continue,
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Storage subscriber lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
