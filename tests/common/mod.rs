#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crypto_tracker::config::Config;
use crypto_tracker::services::local_store::LocalStore;
use crypto_tracker::AppState;

#[derive(Debug, Clone)]
pub struct MockUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

impl MockUser {
    fn session_json(&self) -> Value {
        json!({ "_id": self.id, "name": self.name, "email": self.email, "role": self.role })
    }

    fn roster_json(&self) -> Value {
        json!({
            "_id": self.id,
            "name": self.name,
            "email": self.email,
            "lastLogin": "2025-03-01T10:00:00.000Z",
            "lastLogout": null,
            "role": self.role,
        })
    }
}

/// Everything the fake backend serves, plus knobs to make it slow or failing.
#[derive(Debug, Default)]
pub struct MockState {
    pub pools: Vec<Value>,
    pub bookmarks: HashMap<String, Vec<Value>>,
    pub users: Vec<MockUser>,
    pub home_delay: Duration,
    pub bookmarks_delay: Duration,
    pub fail_home: bool,
    pub fail_bookmark_reads: bool,
    /// Answer `GET /bookmarks/{email}` with 404, as backends do for users with no record
    pub bookmarks_missing: bool,
    pub fail_bookmark_writes: bool,
    pub fail_logout: bool,
    pub signup_returns_user: bool,
    pub last_user_update: Option<Value>,
    hits: HashMap<&'static str, usize>,
}

type Shared = Arc<Mutex<MockState>>;

pub struct MockBackend {
    pub url: String,
    pub state: Shared,
    handle: JoinHandle<()>,
}

impl MockBackend {
    pub async fn spawn() -> Self {
        let state = Arc::new(Mutex::new(MockState {
            pools: vec![
                pool("eth_btc", "Bitcoin", "83137.00", "-1.44", Some("1649732000000"), "30000000000"),
                pool("eth_eth", "Ethereum", "1896.54", "-1.70", Some("228000000000"), "12000000000"),
                pool("eth_ada", "Cardano", "0.7100", "2.10", None, "500000000"),
            ],
            users: vec![
                user("1", "Root", "root@example.com", "rootpw", "admin"),
                user("2", "Ops", "ops@example.com", "opspw", "admin"),
                user("3", "Alice", "alice@example.com", "alicepw", "user"),
                user("4", "Bob", "bob@example.com", "bobpw", "user"),
            ],
            signup_returns_user: true,
            ..Default::default()
        }));

        let app = Router::new()
            .route("/home", get(home))
            .route("/bookmarks/{email}", get(list_bookmarks))
            .route("/bookmark", post(add_bookmark).delete(remove_bookmark))
            .route("/login", post(login))
            .route("/signup", post(signup))
            .route("/logout", post(logout))
            .route("/users", get(list_users))
            .route("/users/{id}", put(update_user).delete(delete_user))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            state,
            handle,
        }
    }

    pub fn hits(&self, route: &str) -> usize {
        self.state.lock().hits.get(route).copied().unwrap_or(0)
    }

    pub fn config(&self) -> Config {
        Config::default().with_api_url(&self.url)
    }

    /// App wired against this backend with a fresh in-memory store.
    pub fn app(&self) -> AppState {
        AppState::with_store(self.config(), LocalStore::in_memory())
    }

    pub fn app_with_store(&self, store: LocalStore) -> AppState {
        AppState::with_store(self.config(), store)
    }

    /// App persisted under `dir`, the way a separate CLI process would open it.
    pub fn open_app(&self, dir: &std::path::Path) -> AppState {
        let mut config = self.config();
        config.data_dir = dir.to_path_buf();
        AppState::open(config).unwrap()
    }

    pub fn server_bookmark_ids(&self, email: &str) -> Vec<String> {
        self.state
            .lock()
            .bookmarks
            .get(email)
            .map(|list| {
                list.iter()
                    .filter_map(|b| b["id"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn seed_bookmark(&self, email: &str, id: &str, symbol: &str) {
        self.state
            .lock()
            .bookmarks
            .entry(email.to_string())
            .or_default()
            .push(json!({ "id": id, "name": symbol, "symbol": symbol, "price": 1.0, "change24h": 0.0 }));
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn pool(
    id: &str,
    name: &str,
    price: &str,
    change: &str,
    market_cap: Option<&str>,
    volume: &str,
) -> Value {
    json!({
        "id": id,
        "type": "pool",
        "attributes": {
            "name": name,
            "base_token_price_usd": price,
            "price_change_percentage": { "h24": change },
            "volume_usd": { "h24": volume },
            "market_cap_usd": market_cap,
        }
    })
}

fn user(id: &str, name: &str, email: &str, password: &str, role: &str) -> MockUser {
    MockUser {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        role: role.to_string(),
    }
}

fn hit(state: &Shared, route: &'static str) {
    *state.lock().hits.entry(route).or_default() += 1;
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

async fn home(State(state): State<Shared>) -> Response {
    hit(&state, "home");
    let (delay, fail) = {
        let s = state.lock();
        (s.home_delay, s.fail_home)
    };
    tokio::time::sleep(delay).await;

    if fail {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let pools = state.lock().pools.clone();
    Json(json!({ "data": pools })).into_response()
}

async fn list_bookmarks(State(state): State<Shared>, Path(email): Path<String>) -> Response {
    hit(&state, "bookmarks");
    let (delay, fail, missing) = {
        let s = state.lock();
        (s.bookmarks_delay, s.fail_bookmark_reads, s.bookmarks_missing)
    };
    tokio::time::sleep(delay).await;

    if fail {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    if missing {
        return StatusCode::NOT_FOUND.into_response();
    }
    let list = state.lock().bookmarks.get(&email).cloned().unwrap_or_default();
    Json(json!({ "bookmarks": list })).into_response()
}

#[derive(Deserialize)]
struct AddBookmarkBody {
    email: String,
    crypto: Value,
}

async fn add_bookmark(State(state): State<Shared>, Json(body): Json<AddBookmarkBody>) -> Response {
    hit(&state, "add_bookmark");
    let mut s = state.lock();
    if s.fail_bookmark_writes {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    s.bookmarks.entry(body.email).or_default().push(body.crypto);
    StatusCode::CREATED.into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveBookmarkBody {
    email: String,
    crypto_id: String,
}

async fn remove_bookmark(
    State(state): State<Shared>,
    Json(body): Json<RemoveBookmarkBody>,
) -> Response {
    hit(&state, "remove_bookmark");
    let mut s = state.lock();
    if s.fail_bookmark_writes {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    if let Some(list) = s.bookmarks.get_mut(&body.email) {
        list.retain(|b| b["id"] != body.crypto_id.as_str());
    }
    StatusCode::OK.into_response()
}

#[derive(Deserialize)]
struct Credentials {
    #[serde(default)]
    name: String,
    email: String,
    password: String,
}

async fn login(State(state): State<Shared>, Json(body): Json<Credentials>) -> Response {
    hit(&state, "login");
    let s = state.lock();
    match s
        .users
        .iter()
        .find(|u| u.email == body.email && u.password == body.password)
    {
        Some(user) => Json(json!({ "user": user.session_json() })).into_response(),
        None => message(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    }
}

async fn signup(State(state): State<Shared>, Json(body): Json<Credentials>) -> Response {
    hit(&state, "signup");
    let mut s = state.lock();
    if s.users.iter().any(|u| u.email == body.email) {
        return message(StatusCode::BAD_REQUEST, "User already exists");
    }

    let created = user(
        &(s.users.len() + 1).to_string(),
        &body.name,
        &body.email,
        &body.password,
        "user",
    );
    let payload = created.session_json();
    s.users.push(created);

    if s.signup_returns_user {
        (StatusCode::CREATED, Json(json!({ "user": payload }))).into_response()
    } else {
        StatusCode::CREATED.into_response()
    }
}

async fn logout(State(state): State<Shared>) -> Response {
    hit(&state, "logout");
    if state.lock().fail_logout {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    StatusCode::OK.into_response()
}

async fn list_users(State(state): State<Shared>) -> Response {
    hit(&state, "users");
    let users: Vec<Value> = state.lock().users.iter().map(MockUser::roster_json).collect();
    Json(users).into_response()
}

async fn update_user(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    hit(&state, "update_user");
    let mut s = state.lock();
    let Some(user) = s.users.iter_mut().find(|u| u.id == id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if let Some(name) = body["name"].as_str() {
        user.name = name.to_string();
    }
    if let Some(password) = body["password"].as_str() {
        user.password = password.to_string();
    }
    s.last_user_update = Some(body);
    StatusCode::OK.into_response()
}

async fn delete_user(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    hit(&state, "delete_user");
    let mut s = state.lock();
    let before = s.users.len();
    s.users.retain(|u| u.id != id);
    if s.users.len() == before {
        return StatusCode::NOT_FOUND.into_response();
    }
    StatusCode::OK.into_response()
}

/// Poll `check` until it holds or `timeout` elapses.
pub async fn eventually(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
