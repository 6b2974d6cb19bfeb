//! Per-peer role scheduler.
//!
//! A peer runs exactly one periodic task, bound to its current role:
//!
//! - **server**: heartbeat log on a fixed period; the ledger routes answer
//! - **seller** / **manager**: every 15-18s, health-check the server, fail
//!   over when it is down, otherwise make one ledger call
//!
//! Switching roles cancels the running task and waits for it to stop before
//! the next one is spawned, so two role tasks never run side by side.

pub mod tasks;
pub mod timer;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::node::PeerContext;
use crate::registry::Role;

struct RoleTask {
    role: Role,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the single role task of one peer.
pub struct RoleScheduler {
    current: Mutex<Option<RoleTask>>,
    active: Arc<AtomicUsize>,
}

impl Default for RoleScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RoleScheduler {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Cancel the running task (if any), then install the task for `role`.
    pub async fn switch_to(&self, role: Role, ctx: Arc<PeerContext>) {
        let mut current = self.current.lock().await;
        if let Some(task) = current.take() {
            tracing::info!(from = %task.role, to = %role, "Switching role");
            Self::stop(task).await;
        }

        let cancel = CancellationToken::new();
        let live = LiveTask::enter(self.active.clone());
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let _live = live;
            tasks::run(role, ctx, token).await;
        });

        *current = Some(RoleTask {
            role,
            cancel,
            handle,
        });
        tracing::info!(role = %role, "Role task installed");
    }

    /// Cancel the running task and wait for it to stop. Returns the role it
    /// was serving.
    pub async fn cancel(&self) -> Option<Role> {
        let task = self.current.lock().await.take()?;
        let role = task.role;
        Self::stop(task).await;
        Some(role)
    }

    /// Role of the installed task, if any.
    pub async fn current_role(&self) -> Option<Role> {
        self.current.lock().await.as_ref().map(|task| task.role)
    }

    /// Number of role tasks that have not finished yet.
    pub fn active_tasks(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    async fn stop(task: RoleTask) {
        task.cancel.cancel();
        if let Err(e) = task.handle.await {
            if e.is_panic() {
                tracing::error!(role = %task.role, error = %e, "Role task panicked");
            }
        }
    }
}

// Counted from spawn until the task future is dropped, whether it ran to
// completion or never got polled.
struct LiveTask(Arc<AtomicUsize>);

impl LiveTask {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LiveTask {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
