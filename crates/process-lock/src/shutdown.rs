//! Process-exit cleanup for held locks.

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::signal;
use tracing::{info, instrument};

use process_lock_core::traits::LockBackend;
use process_lock_file::FileLockBackend;

use crate::leader::LeaderLock;
use crate::resources::ResourceLocks;

// ============================================================================
// Shutdown Coordinator
// ============================================================================

/// Releases every held lock on the way out of the process.
///
/// Covers the three exit paths: normal return from `main` (call
/// [`shutdown`](Self::shutdown) yourself), interrupt, and termination
/// signals (await [`wait_for_signal`](Self::wait_for_signal), or install it
/// in the background with [`spawn`](Self::spawn)). Resource locks are
/// released before the leader lock, so processes waiting on individual
/// resources proceed while the final leader bookkeeping completes. The
/// cleanup body runs at most once no matter how many triggers fire.
pub struct ShutdownCoordinator<B: LockBackend = FileLockBackend> {
    resources: ResourceLocks<B>,
    leader: LeaderLock<B>,
    fired: Arc<AtomicBool>,
}

impl<B: LockBackend> Clone for ShutdownCoordinator<B> {
    fn clone(&self) -> Self {
        Self {
            resources: self.resources.clone(),
            leader: self.leader.clone(),
            fired: Arc::clone(&self.fired),
        }
    }
}

impl<B: LockBackend + 'static> ShutdownCoordinator<B> {
    /// Creates a coordinator draining the given managers.
    pub fn new(resources: ResourceLocks<B>, leader: LeaderLock<B>) -> Self {
        Self {
            resources,
            leader,
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Releases all resource locks, then the leader lock.
    ///
    /// Idempotent: only the first call (across all clones) releases
    /// anything.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) {
        if self.fired.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("releasing held locks before exit");
        self.resources.release_all().await;
        self.leader.release().await;
    }

    /// Waits for an interrupt or termination signal, runs the cleanup, and
    /// terminates the process with the conventional `128 + signal` code.
    pub async fn wait_for_signal(&self) -> Infallible {
        let code = wait_for_termination().await;
        self.shutdown().await;
        std::process::exit(code);
    }

    /// Installs the signal wait as a background task.
    pub fn spawn(&self) -> tokio::task::JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator.wait_for_signal().await;
        })
    }
}

/// Resolves when the process receives SIGINT or SIGTERM, yielding the exit
/// code the process should terminate with.
async fn wait_for_termination() -> i32 {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received interrupt signal");
            130
        }
        _ = terminate => {
            info!("received termination signal");
            143
        }
    }
}
