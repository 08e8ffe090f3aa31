mod common;

use common::MockBackend;
use crypto_tracker::models::asset::Asset;
use crypto_tracker::models::session::{Role, Session};
use crypto_tracker::services::backend::BackendClient;
use crypto_tracker::services::bookmarks::{BookmarkReconciler, ReconcilerState};
use std::time::Duration;

fn session(email: &str) -> Session {
    Session {
        id: email.to_string(),
        email: email.to_string(),
        role: Role::User,
        name: None,
    }
}

async fn market(backend: &MockBackend) -> Vec<Asset> {
    BackendClient::new(&backend.url)
        .fetch_market()
        .await
        .unwrap()
        .assets()
        .to_vec()
}

async fn signed_in(backend: &MockBackend, email: &str) -> BookmarkReconciler {
    let reconciler = BookmarkReconciler::new(BackendClient::new(&backend.url));
    reconciler.switch_session(Some(session(email)));
    reconciler.load(email).await.unwrap();
    reconciler
}

#[tokio::test]
async fn test_add_then_remove() {
    let backend = MockBackend::spawn().await;
    let assets = market(&backend).await;
    let reconciler = signed_in(&backend, "alice@example.com").await;
    assert_eq!(reconciler.state(), ReconcilerState::Ready);

    reconciler.add(&assets[0]).await.unwrap();
    assert!(reconciler.is_bookmarked("eth_btc"));
    assert_eq!(backend.server_bookmark_ids("alice@example.com"), vec!["eth_btc"]);

    // Already bookmarked: no second request
    reconciler.add(&assets[0]).await.unwrap();
    assert_eq!(backend.hits("add_bookmark"), 1);

    reconciler.remove("eth_btc").await.unwrap();
    assert!(!reconciler.is_bookmarked("eth_btc"));
    assert!(backend.server_bookmark_ids("alice@example.com").is_empty());
}

#[tokio::test]
async fn test_removing_unknown_bookmark_is_noop() {
    let backend = MockBackend::spawn().await;
    let reconciler = signed_in(&backend, "alice@example.com").await;

    reconciler.remove("eth_doge").await.unwrap();
    assert_eq!(backend.hits("remove_bookmark"), 0);
    assert!(reconciler.bookmarks().is_empty());
}

#[tokio::test]
async fn test_failed_add_leaves_set_unchanged() {
    let backend = MockBackend::spawn().await;
    let assets = market(&backend).await;
    let reconciler = signed_in(&backend, "alice@example.com").await;
    reconciler.add(&assets[1]).await.unwrap();

    backend.state.lock().fail_bookmark_writes = true;
    let err = reconciler.add(&assets[0]).await.unwrap_err();
    assert!(err.is_network());
    assert!(!reconciler.is_bookmarked("eth_btc"));

    let err = reconciler.remove("eth_eth").await.unwrap_err();
    assert!(err.is_network());
    assert!(reconciler.is_bookmarked("eth_eth"));
}

#[tokio::test]
async fn test_toggle() {
    let backend = MockBackend::spawn().await;
    let assets = market(&backend).await;
    let reconciler = signed_in(&backend, "alice@example.com").await;

    assert!(reconciler.toggle(&assets[2]).await.unwrap());
    assert!(!reconciler.toggle(&assets[2]).await.unwrap());
}

#[tokio::test]
async fn test_load_fetches_server_set() {
    let backend = MockBackend::spawn().await;
    backend.seed_bookmark("bob@example.com", "eth_eth", "ETH");
    backend.seed_bookmark("bob@example.com", "eth_ada", "ADA");

    let reconciler = signed_in(&backend, "bob@example.com").await;
    assert!(reconciler.is_bookmarked("eth_eth"));
    assert!(reconciler.is_bookmarked("eth_ada"));
    assert_eq!(reconciler.bookmarks().len(), 2);
}

#[tokio::test]
async fn test_failed_load_keeps_set_and_ends_ready() {
    let backend = MockBackend::spawn().await;
    backend.seed_bookmark("bob@example.com", "eth_eth", "ETH");
    let reconciler = signed_in(&backend, "bob@example.com").await;

    backend.seed_bookmark("bob@example.com", "eth_ada", "ADA");
    backend.state.lock().fail_bookmark_reads = true;

    assert!(reconciler.reload().await.is_err());
    assert_eq!(reconciler.state(), ReconcilerState::Ready);
    assert!(reconciler.is_bookmarked("eth_eth"));
    assert!(!reconciler.is_bookmarked("eth_ada"));
}

#[tokio::test]
async fn test_without_session_everything_is_noop() {
    let backend = MockBackend::spawn().await;
    let assets = market(&backend).await;
    let reconciler = BookmarkReconciler::new(BackendClient::new(&backend.url));

    assert_eq!(reconciler.state(), ReconcilerState::Unauthenticated);
    reconciler.add(&assets[0]).await.unwrap();
    reconciler.load("alice@example.com").await.unwrap();
    assert!(!reconciler.is_bookmarked("eth_btc"));
    assert_eq!(backend.hits("add_bookmark"), 0);
    assert_eq!(backend.hits("bookmarks"), 0);
    assert_eq!(reconciler.state(), ReconcilerState::Unauthenticated);
}

#[tokio::test]
async fn test_session_switch_clears_before_load() {
    let backend = MockBackend::spawn().await;
    backend.seed_bookmark("alice@example.com", "eth_btc", "BTC");
    backend.seed_bookmark("bob@example.com", "eth_ada", "ADA");

    let reconciler = signed_in(&backend, "alice@example.com").await;
    assert!(reconciler.is_bookmarked("eth_btc"));

    reconciler.switch_session(Some(session("bob@example.com")));
    assert!(reconciler.bookmarks().is_empty());
    assert!(!reconciler.is_bookmarked("eth_btc"));
    assert_eq!(reconciler.session_email().as_deref(), Some("bob@example.com"));

    reconciler.load("bob@example.com").await.unwrap();
    assert!(reconciler.is_bookmarked("eth_ada"));
    assert!(!reconciler.is_bookmarked("eth_btc"));

    reconciler.switch_session(None);
    assert_eq!(reconciler.state(), ReconcilerState::Unauthenticated);
    assert!(reconciler.bookmarks().is_empty());
}

#[tokio::test]
async fn test_load_for_previous_session_is_discarded() {
    let backend = MockBackend::spawn().await;
    backend.seed_bookmark("alice@example.com", "eth_btc", "BTC");
    backend.state.lock().bookmarks_delay = Duration::from_millis(200);

    let reconciler = BookmarkReconciler::new(BackendClient::new(&backend.url));
    reconciler.switch_session(Some(session("alice@example.com")));

    let (loaded, _) = tokio::join!(reconciler.load("alice@example.com"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        reconciler.switch_session(Some(session("bob@example.com")));
    });

    loaded.unwrap();
    assert!(!reconciler.is_bookmarked("eth_btc"));
    assert_eq!(reconciler.session_email().as_deref(), Some("bob@example.com"));
}

#[tokio::test]
async fn test_symbol_lookups_match_id_lookups() {
    let backend = MockBackend::spawn().await;
    let assets = market(&backend).await;
    let reconciler = signed_in(&backend, "alice@example.com").await;
    reconciler.add(&assets[0]).await.unwrap();

    for symbol in ["BTC", "btc", "Btc"] {
        assert_eq!(reconciler.resolve_symbol(symbol).as_deref(), Some("eth_btc"));
        assert_eq!(
            reconciler.is_bookmarked_symbol(symbol),
            reconciler.is_bookmarked("eth_btc")
        );
    }
    assert_eq!(reconciler.resolve_symbol("ETH"), None);
    assert!(!reconciler.is_bookmarked_symbol("ETH"));

    reconciler.remove_by_symbol("eth").await.unwrap();
    assert_eq!(backend.hits("remove_bookmark"), 0);

    reconciler.remove_by_symbol("btc").await.unwrap();
    assert!(!reconciler.is_bookmarked("eth_btc"));
    assert!(!reconciler.is_bookmarked_symbol("BTC"));
}

#[tokio::test]
async fn test_missing_bookmark_record_loads_as_empty() {
    let backend = MockBackend::spawn().await;
    backend.state.lock().bookmarks_missing = true;

    let reconciler = BookmarkReconciler::new(BackendClient::new(&backend.url));
    reconciler.switch_session(Some(session("new@example.com")));
    reconciler.load("new@example.com").await.unwrap();

    assert_eq!(reconciler.state(), ReconcilerState::Ready);
    assert!(reconciler.bookmarks().is_empty());
    assert_eq!(reconciler.bookmark_status("eth_btc"), Some(false));
}

#[tokio::test]
async fn test_email_is_sent_as_one_path_segment() {
    let backend = MockBackend::spawn().await;
    let email = "odd/name#1?x@example.com";
    backend.seed_bookmark(email, "eth_ada", "ADA");

    let reconciler = signed_in(&backend, email).await;
    assert!(reconciler.is_bookmarked("eth_ada"));
}
