//! Leader election over a single advisory lock file.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, instrument, warn};

use process_lock_core::error::LockResult;
use process_lock_core::traits::{LockBackend, LockHandle};
use process_lock_file::FileLockBackend;

use crate::paths::LockPaths;

/// Interval between leadership retry attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

// ============================================================================
// Leader Lock
// ============================================================================

/// Single-slot leader election among processes sharing one host.
///
/// A process is either a follower (the initial state) or the leader.
/// [`acquire`](Self::acquire) makes one non-blocking attempt on the leader
/// lock file; when the attempt fails, a background task re-attempts on a
/// fixed interval until this process becomes leader, and is cancelled the
/// moment it does. At most one process on the host holds the lock at a
/// time; that guarantee comes from the OS lock, not from anything in
/// memory.
///
/// Cloning is cheap and every clone shares the same election slot.
pub struct LeaderLock<B: LockBackend = FileLockBackend> {
    inner: Arc<LeaderInner<B>>,
}

struct LeaderInner<B: LockBackend> {
    backend: B,
    path: PathBuf,
    retry_interval: Duration,
    slot: Mutex<LeaderSlot<B::Handle>>,
}

/// Mutable election state: the held lock and the pending retry task.
struct LeaderSlot<H> {
    handle: Option<H>,
    retry_task: Option<JoinHandle<()>>,
}

impl<B: LockBackend> Clone for LeaderLock<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl LeaderLock {
    /// Creates a leader lock in the standard layout, backed by OS file
    /// locks, retrying every five seconds while another process leads.
    ///
    /// Sets up the lock directories; directory failure is the only hard
    /// error here.
    pub fn new(paths: &LockPaths) -> LockResult<Self> {
        Self::with_backend(paths, FileLockBackend::new(), DEFAULT_RETRY_INTERVAL)
    }
}

impl<B: LockBackend + 'static> LeaderLock<B> {
    /// Creates a leader lock with an explicit backend and retry interval.
    pub fn with_backend(
        paths: &LockPaths,
        backend: B,
        retry_interval: Duration,
    ) -> LockResult<Self> {
        paths.ensure()?;
        Ok(Self {
            inner: Arc::new(LeaderInner {
                backend,
                path: paths.leader_lock_path(),
                retry_interval,
                slot: Mutex::new(LeaderSlot {
                    handle: None,
                    retry_task: None,
                }),
            }),
        })
    }

    /// Attempts to become the leader.
    ///
    /// Returns true when this process is the leader afterwards, including
    /// when it already was (idempotent, no I/O in that case). A failed
    /// attempt leaves a retry task behind (never more than one) and returns
    /// false; failing is the expected outcome for every non-leader process
    /// and is never an error.
    #[instrument(skip(self), fields(lock.path = %self.inner.path.display()))]
    pub async fn acquire(&self) -> bool {
        LeaderInner::try_become_leader(&self.inner).await
    }

    /// Releases leadership.
    ///
    /// No-op for followers. The local state always transitions back to
    /// follower, even when the OS-level release fails; the failure is
    /// logged. This manager never claims leadership it cannot prove it
    /// holds.
    #[instrument(skip(self), fields(lock.path = %self.inner.path.display()))]
    pub async fn release(&self) {
        let handle = {
            let mut slot = self.inner.slot.lock().unwrap();
            slot.handle.take()
        };

        let Some(handle) = handle else {
            return;
        };

        match handle.release().await {
            Ok(()) => info!("released leadership"),
            Err(e) => warn!(error = %e, "leader lock release failed; continuing as follower"),
        }
    }

    /// Returns true while this process holds the leader lock. No I/O.
    pub fn is_leader(&self) -> bool {
        self.inner.slot.lock().unwrap().handle.is_some()
    }

    /// Returns true while a retry task is waiting to re-attempt
    /// acquisition.
    pub fn retry_scheduled(&self) -> bool {
        self.inner.slot.lock().unwrap().retry_task.is_some()
    }

    /// Returns where the leader lock lives, for diagnostics.
    pub fn lock_path(&self) -> &Path {
        &self.inner.path
    }
}

impl<B: LockBackend + 'static> LeaderInner<B> {
    async fn try_become_leader(inner: &Arc<Self>) -> bool {
        if inner.slot.lock().unwrap().handle.is_some() {
            return true;
        }

        let acquired = match inner.backend.try_lock(&inner.path).await {
            Ok(Some(handle)) => Some(handle),
            Ok(None) => {
                debug!(lock.path = %inner.path.display(), "leader lock held by another process");
                None
            }
            Err(e) => {
                warn!(error = %e, "leader lock attempt failed");
                None
            }
        };

        let mut slot = inner.slot.lock().unwrap();
        match acquired {
            Some(handle) => {
                slot.handle = Some(handle);
                if let Some(task) = slot.retry_task.take() {
                    task.abort();
                }
                info!(lock.path = %inner.path.display(), "became leader");
                true
            }
            None => {
                if slot.handle.is_some() {
                    // Another clone won the race while we were attempting;
                    // this process leads either way.
                    return true;
                }
                if slot.retry_task.is_none() {
                    slot.retry_task = Some(Self::spawn_retry(inner));
                }
                false
            }
        }
    }

    /// Spawns the task that re-attempts acquisition until leadership.
    ///
    /// The task holds only a weak reference, so dropping the last
    /// [`LeaderLock`] clone ends it. On success `try_become_leader` takes
    /// the task handle out of the slot and aborts it, which keeps exactly
    /// one retry pending at any time and none once this process leads.
    fn spawn_retry(inner: &Arc<Self>) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(inner);
        let retry_interval = inner.retry_interval;

        tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + retry_interval, retry_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;

                let Some(inner) = weak.upgrade() else {
                    break;
                };

                debug!(lock.path = %inner.path.display(), "retrying leader acquisition");
                if Self::try_become_leader(&inner).await {
                    break;
                }
            }
        })
    }
}

impl<B: LockBackend> Drop for LeaderInner<B> {
    fn drop(&mut self) {
        if let Ok(slot) = self.slot.get_mut() {
            if let Some(task) = slot.retry_task.take() {
                task.abort();
            }
        }
    }
}
