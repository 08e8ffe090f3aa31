use tracing::{info, warn};

use crate::error::Result;
use crate::jobs::supervisor::ScopedTask;
use crate::models::session::Session;
use crate::services::bookmarks::BookmarkReconciler;
use crate::services::session::SessionManager;

enum Step {
    Loaded(Result<()>),
    Switched(Option<Option<Session>>),
}

/// Keep the reconciler scoped to the active session: on every session change the
/// old set is dropped first, then the new user's bookmarks are loaded. A switch
/// that arrives mid-load abandons that load.
pub fn start_session_sync_job(
    session: &SessionManager,
    bookmarks: BookmarkReconciler,
) -> ScopedTask {
    let mut subscription = session.subscribe();

    ScopedTask::spawn(async move {
        let mut active = subscription.current();

        loop {
            bookmarks.switch_session(active.clone());

            let next = match active.as_ref().map(|s| s.email.clone()) {
                Some(email) => {
                    let step = tokio::select! {
                        result = bookmarks.load(&email) => Step::Loaded(result),
                        next = subscription.changed() => Step::Switched(next),
                    };
                    match step {
                        Step::Loaded(result) => {
                            if let Err(e) = result {
                                warn!("Failed to load bookmarks for {}: {}", email, e);
                            }
                            subscription.changed().await
                        }
                        Step::Switched(next) => next,
                    }
                }
                None => subscription.changed().await,
            };

            match next {
                Some(next) => {
                    info!(
                        "Session switched to {}",
                        next.as_ref().map(|s| s.email.as_str()).unwrap_or("<none>")
                    );
                    active = next;
                }
                None => break,
            }
        }
    })
}
