//! Pending-work guard.
//!
//! The host may reclaim the worker as soon as an event handler returns. Work
//! that must outlive the handler (cache writes, notification rendering) is
//! registered here, and whoever delivered the event awaits [`PendingWork::settle`]
//! before reporting the event as finished.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use tokio::task::JoinSet;

/// Work an event has started and must finish before the worker is released.
#[derive(Default)]
pub struct PendingWork {
    tasks: Mutex<JoinSet<()>>,
}

impl PendingWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `work` immediately and keep the event open until it completes.
    ///
    /// Must be called from within a tokio runtime.
    pub fn wait_until<F>(&self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).spawn(work);
    }

    /// Number of registered tasks that have not been collected yet.
    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait for every registered task. Returns how many ran.
    ///
    /// A panicking task is logged and counted; it does not abort the others.
    pub async fn settle(self) -> usize {
        let mut tasks = self.tasks.into_inner().unwrap_or_else(PoisonError::into_inner);
        let mut settled = 0;
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "pending work did not complete");
            }
            settled += 1;
        }
        settled
    }
}
