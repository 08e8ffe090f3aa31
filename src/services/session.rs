//! Session Manager
//!
//! Owns the active `Session`: persisted under the `user` key, created by
//! login/signup, destroyed by logout. Other tabs sharing the same store see
//! the change through `subscribe()`, which also follows writes made by them.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::Result;
use crate::jobs::supervisor::ScopedTask;
use crate::models::session::Session;
use crate::services::auth::Authenticator;
use crate::services::cache_store::{parse_session, CacheStore};
use crate::services::local_store::USER_KEY;

struct SessionInner {
    auth: Arc<dyn Authenticator>,
    cache: CacheStore,
    current: watch::Sender<Option<Session>>,
}

impl SessionInner {
    /// Returns true when the value actually changed.
    fn publish(&self, session: Option<Session>) -> bool {
        self.current.send_if_modified(|current| {
            if *current == session {
                false
            } else {
                *current = session;
                true
            }
        })
    }
}

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

impl SessionManager {
    pub fn new(auth: Arc<dyn Authenticator>, cache: CacheStore) -> Self {
        let (current, _) = watch::channel(cache.session());
        Self {
            inner: Arc::new(SessionInner {
                auth,
                cache,
                current,
            }),
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.inner.current.borrow().clone()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.inner.auth.login(email, password).await?;
        self.establish(session.clone())?;
        info!("Logged in as {}", session.email);
        Ok(session)
    }

    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<Session> {
        let session = self.inner.auth.signup(name, email, password).await?;
        self.establish(session.clone())?;
        info!("Signed up and logged in as {}", session.email);
        Ok(session)
    }

    /// Best-effort notification to the provider, then the local session is always cleared.
    pub async fn logout(&self) -> Result<()> {
        let Some(session) = self.current() else {
            return Ok(());
        };

        if let Err(e) = self.inner.auth.logout(&session).await {
            warn!("Logout API error: {}", e);
        }

        self.inner.cache.clear_session()?;
        self.inner.publish(None);
        info!("Logged out {}", session.email);
        Ok(())
    }

    /// Follow session changes from this handle and from other tabs of the same store.
    /// Dropping the subscription stops the storage listener.
    pub fn subscribe(&self) -> SessionSubscription {
        let mut storage = self.inner.cache.store().subscribe();
        let inner = self.inner.clone();

        let listener = ScopedTask::spawn(async move {
            while let Some(event) = storage.recv().await {
                if event.key != USER_KEY {
                    continue;
                }
                let session = parse_session(event.new_value.as_deref());
                let email = session.as_ref().map(|s| s.email.clone());
                if inner.publish(session) {
                    match email {
                        Some(email) => info!("Session changed in another tab: {}", email),
                        None => info!("Logged out in another tab"),
                    }
                }
            }
        });

        SessionSubscription {
            rx: self.inner.current.subscribe(),
            _listener: listener,
        }
    }

    fn establish(&self, session: Session) -> Result<()> {
        self.inner.cache.write_session(&session)?;
        self.inner.publish(Some(session));
        Ok(())
    }
}

pub struct SessionSubscription {
    rx: watch::Receiver<Option<Session>>,
    _listener: ScopedTask,
}

impl SessionSubscription {
    pub fn current(&self) -> Option<Session> {
        self.rx.borrow().clone()
    }

    /// Wait for the next session change. `None` once the manager is gone.
    pub async fn changed(&mut self) -> Option<Option<Session>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
