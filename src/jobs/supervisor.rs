//! Task supervision helpers shared by the background jobs.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Single-slot supervisor: at most one run at a time, and a run requested
/// while another is in flight is dropped rather than queued.
#[derive(Clone, Default)]
pub struct SingleSlot {
    busy: Arc<Mutex<()>>,
}

impl SingleSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` if the slot is free. Returns `None` when the run was skipped.
    pub async fn run_if_idle<F, T>(&self, task: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let _guard = self.busy.try_lock().ok()?;
        Some(task.await)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.try_lock().is_err()
    }
}

/// Owned background task, aborted on `stop()` or when dropped.
#[derive(Debug)]
pub struct ScopedTask {
    handle: Option<JoinHandle<()>>,
}

impl ScopedTask {
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: Some(tokio::spawn(future)),
        }
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ScopedTask {
    fn drop(&mut self) {
        self.stop();
    }
}
