//! Authentication providers
//!
//! `SessionManager` talks to an injected `Authenticator`: the remote backend
//! in production, or an `InMemoryRoster` for offline use and tests. The
//! roster is an owned value with an explicit lifecycle, not process-wide state.

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

use crate::error::{ClientError, Result};
use crate::models::session::{Role, Session};
use crate::services::backend::BackendClient;

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<Session>;

    async fn signup(&self, name: &str, email: &str, password: &str) -> Result<Session>;

    /// Tell the provider the session ended. Failures are reported but never block logout.
    async fn logout(&self, session: &Session) -> Result<()>;
}

#[async_trait]
impl Authenticator for BackendClient {
    async fn login(&self, email: &str, password: &str) -> Result<Session> {
        BackendClient::login(self, email, password).await
    }

    async fn signup(&self, name: &str, email: &str, password: &str) -> Result<Session> {
        match BackendClient::signup(self, name, email, password).await? {
            Some(session) => Ok(session),
            None => BackendClient::login(self, email, password).await,
        }
    }

    async fn logout(&self, session: &Session) -> Result<()> {
        BackendClient::logout(self, &session.email).await
    }
}

#[derive(Debug, Clone)]
struct StoredUser {
    id: String,
    name: String,
    email: String,
    password: String,
    role: Role,
}

impl StoredUser {
    fn session(&self) -> Session {
        Session {
            id: self.id.clone(),
            email: self.email.clone(),
            role: self.role,
            name: Some(self.name.clone()),
        }
    }
}

/// User repository held in memory. Ids are assigned sequentially from 1.
#[derive(Default)]
pub struct InMemoryRoster {
    users: Mutex<Vec<StoredUser>>,
}

impl InMemoryRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account directly, e.g. the initial admin.
    pub fn insert(&self, name: &str, email: &str, password: &str, role: Role) -> Session {
        let mut users = self.users.lock();
        let user = StoredUser {
            id: (users.len() + 1).to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role,
        };
        let session = user.session();
        users.push(user);
        session
    }

    pub fn len(&self) -> usize {
        self.users.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.lock().is_empty()
    }
}

#[async_trait]
impl Authenticator for InMemoryRoster {
    async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let users = self.users.lock();
        users
            .iter()
            .find(|u| u.email == email && u.password == password)
            .map(StoredUser::session)
            .ok_or_else(|| ClientError::AuthFailure("Invalid credentials".to_string()))
    }

    async fn signup(&self, name: &str, email: &str, password: &str) -> Result<Session> {
        if self.users.lock().iter().any(|u| u.email == email) {
            return Err(ClientError::AuthFailure("User already exists".to_string()));
        }
        let session = self.insert(name, email, password, Role::User);
        info!("Registered {} in local roster", email);
        Ok(session)
    }

    async fn logout(&self, _session: &Session) -> Result<()> {
        Ok(())
    }
}
