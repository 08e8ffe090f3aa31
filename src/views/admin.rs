//! Admin roster panel
//!
//! Only reachable with an admin session. Deletion is guarded twice: admin
//! accounts and the acting admin can never be deleted, and every other delete
//! waits for an explicit confirmation before anything is sent.

use tracing::{info, warn};

use crate::error::{ClientError, Result};
use crate::models::{
    session::{Role, Session},
    user::{RosterUser, UpdateUserRequest},
};
use crate::services::backend::BackendClient;

pub struct AdminPanel {
    backend: BackendClient,
    actor: Session,
    users: Vec<RosterUser>,
}

impl AdminPanel {
    pub fn for_session(backend: BackendClient, session: Option<&Session>) -> Result<Self> {
        let actor = session
            .ok_or_else(|| ClientError::PermissionDenied("not logged in".to_string()))?;
        if !actor.is_admin() {
            warn!("Non-admin {} tried to open the admin panel", actor.email);
            return Err(ClientError::PermissionDenied(format!(
                "{} is not an admin",
                actor.email
            )));
        }

        Ok(Self {
            backend,
            actor: actor.clone(),
            users: Vec::new(),
        })
    }

    pub async fn list(&mut self) -> Result<&[RosterUser]> {
        self.users = self.backend.list_users().await?;
        Ok(&self.users)
    }

    pub fn users(&self) -> &[RosterUser] {
        &self.users
    }

    pub fn find(&self, id: &str) -> Option<&RosterUser> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn search(&self, query: &str) -> Vec<&RosterUser> {
        if query.trim().is_empty() {
            return self.users.iter().collect();
        }
        self.users.iter().filter(|u| u.matches(query.trim())).collect()
    }

    /// An empty `password` keeps the current one.
    pub async fn update(&mut self, id: &str, name: &str, password: &str) -> Result<()> {
        let request = UpdateUserRequest {
            name: name.to_string(),
            password: (!password.is_empty()).then(|| password.to_string()),
        };
        self.backend.update_user(id, &request).await?;

        if let Some(user) = self.users.iter_mut().find(|u| u.id == id) {
            user.name = request.name;
        }
        info!("Admin {} updated user {}", self.actor.email, id);
        Ok(())
    }

    pub fn can_delete(&self, user: &RosterUser) -> bool {
        user.role != Role::Admin && user.id != self.actor.id && user.email != self.actor.email
    }

    /// Returns `Ok(false)` when `confirm` declines; no request is sent in that case.
    pub async fn delete<F>(&mut self, user: &RosterUser, confirm: F) -> Result<bool>
    where
        F: FnOnce(&RosterUser) -> bool,
    {
        if !self.can_delete(user) {
            return Err(ClientError::PermissionDenied(format!(
                "{} cannot be deleted",
                user.email
            )));
        }
        if !confirm(user) {
            return Ok(false);
        }

        self.backend.delete_user(&user.id).await?;
        self.users.retain(|u| u.id != user.id);
        info!("Admin {} deleted user {}", self.actor.email, user.email);
        Ok(true)
    }
}
