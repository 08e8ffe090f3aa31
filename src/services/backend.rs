use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::normalize_base_url;
use crate::error::{ClientError, Result};
use crate::models::{
    asset::{Asset, HomeResponse, MarketSnapshot},
    bookmark::{AddBookmarkRequest, Bookmark, BookmarksResponse, RemoveBookmarkRequest},
    session::{AuthResponse, ErrorResponse, LoginRequest, LogoutRequest, Session, SignupRequest},
    user::{RosterUser, UpdateUserRequest},
};

const GENERIC_AUTH_ERROR: &str = "Something went wrong";

/// REST client for the tracker backend. Cheap to clone.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    // No per-request timeout: requests rely on the transport defaults.
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            client: Client::new(),
            base_url: normalize_base_url(base_url.as_ref()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Base URL plus percent-encoded path segments, so ids and emails can't escape their segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let invalid = || ClientError::InvalidUrl(self.base_url.clone());
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn fetch_market(&self) -> Result<MarketSnapshot> {
        let response = self.client.get(self.url("/home")).send().await?;
        let home: HomeResponse = decode(check(response).await?).await?;

        debug!("Fetched {} market entries", home.data.len());
        Ok(MarketSnapshot::from(home))
    }

    pub async fn fetch_bookmarks(&self, email: &str) -> Result<Vec<Bookmark>> {
        let url = self.endpoint(&["bookmarks", email])?;
        let response = self.client.get(url).send().await?;
        let body: BookmarksResponse = match check(response).await {
            Ok(response) => decode(response).await?,
            Err(ClientError::NotFound(_)) => {
                debug!("No bookmarks recorded for {}", email);
                BookmarksResponse::default()
            }
            Err(e) => return Err(e),
        };

        debug!("Fetched {} bookmarks for {}", body.bookmarks.len(), email);
        Ok(body.bookmarks)
    }

    pub async fn add_bookmark(&self, email: &str, asset: &Asset) -> Result<()> {
        let response = self
            .client
            .post(self.url("/bookmark"))
            .json(&AddBookmarkRequest {
                email,
                crypto: asset,
            })
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    pub async fn remove_bookmark(&self, email: &str, crypto_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url("/bookmark"))
            .json(&RemoveBookmarkRequest { email, crypto_id })
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .client
            .post(self.url("/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        let body: AuthResponse = decode(check_auth(response).await?).await?;
        body.user
            .ok_or_else(|| ClientError::AuthFailure(GENERIC_AUTH_ERROR.to_string()))
    }

    /// Some backends answer signup without a user; the caller then logs in.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<Option<Session>> {
        let response = self
            .client
            .post(self.url("/signup"))
            .json(&SignupRequest {
                name,
                email,
                password,
            })
            .send()
            .await?;

        let response = check_auth(response).await?;
        let bytes = response.bytes().await?;
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(None);
        }
        let body: AuthResponse = serde_json::from_slice(&bytes)?;
        Ok(body.user)
    }

    pub async fn logout(&self, email: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url("/logout"))
            .json(&LogoutRequest { email })
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<RosterUser>> {
        let response = self.client.get(self.url("/users")).send().await?;
        let users: Vec<RosterUser> = decode(check(response).await?).await?;

        info!("Fetched {} users", users.len());
        Ok(users)
    }

    pub async fn update_user(&self, id: &str, update: &UpdateUserRequest) -> Result<()> {
        let response = self
            .client
            .put(self.endpoint(&["users", id])?)
            .json(update)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    pub async fn delete_user(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.endpoint(&["users", id])?)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

async fn check(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(response.url().path().to_string()));
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status { status, body })
}

/// Auth endpoints report user-facing failures in a `{ "message": ... }` body.
async fn check_auth(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .ok()
        .and_then(|e| e.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| GENERIC_AUTH_ERROR.to_string());

    debug!("Auth request rejected with {}: {}", status, message);
    Err(ClientError::AuthFailure(message))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
