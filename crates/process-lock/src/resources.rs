//! Per-resource exclusive locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, instrument, warn};

use process_lock_core::error::LockResult;
use process_lock_core::traits::{LockBackend, LockHandle};
use process_lock_file::FileLockBackend;

use crate::paths::LockPaths;

// ============================================================================
// Resource Locks
// ============================================================================

/// Exclusive locks over caller-named resources, one lock file per resource.
///
/// Tracks which resources this process currently holds. Acquisition is
/// idempotent per identifier and never fails hard: contention, stale lock
/// files, and backend errors all surface as a `false` return. A resource
/// that cannot be locked is busy, and callers are expected to defer or skip
/// it.
///
/// Cloning is cheap and every clone shares the same held set.
pub struct ResourceLocks<B: LockBackend = FileLockBackend> {
    inner: Arc<ResourceInner<B>>,
}

struct ResourceInner<B: LockBackend> {
    backend: B,
    paths: LockPaths,
    held: Mutex<HashMap<String, B::Handle>>,
}

impl<B: LockBackend> Clone for ResourceLocks<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ResourceLocks {
    /// Creates a resource lock manager in the standard layout, backed by OS
    /// file locks.
    ///
    /// Sets up the lock directories; directory failure is the only hard
    /// error here.
    pub fn new(paths: &LockPaths) -> LockResult<Self> {
        Self::with_backend(paths, FileLockBackend::new())
    }
}

impl<B: LockBackend> ResourceLocks<B> {
    /// Creates a resource lock manager with an explicit backend.
    pub fn with_backend(paths: &LockPaths, backend: B) -> LockResult<Self> {
        paths.ensure()?;
        Ok(Self {
            inner: Arc::new(ResourceInner {
                backend,
                paths: paths.clone(),
                held: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Attempts to take the exclusive lock for a resource.
    ///
    /// Returns true when this process holds the lock afterwards, including
    /// when it already did (idempotent). Contention and backend failures
    /// both return false.
    #[instrument(skip(self), fields(resource = %resource_id))]
    pub async fn acquire(&self, resource_id: &str) -> bool {
        if self.inner.held.lock().unwrap().contains_key(resource_id) {
            return true;
        }

        let path = self.inner.paths.resource_lock_path(resource_id);
        match self.inner.backend.try_lock(&path).await {
            Ok(Some(handle)) => {
                debug!(lock.path = %path.display(), "resource lock acquired");
                self.inner
                    .held
                    .lock()
                    .unwrap()
                    .insert(resource_id.to_string(), handle);
                true
            }
            Ok(None) => {
                debug!(lock.path = %path.display(), "resource lock held by another process");
                false
            }
            Err(e) => {
                warn!(error = %e, "resource lock attempt failed");
                false
            }
        }
    }

    /// Releases the lock for a resource.
    ///
    /// No-op when this process does not hold it. The held entry is removed
    /// even when the OS-level release fails, so a failed release never
    /// leaves behind an entry that cannot be released again.
    #[instrument(skip(self), fields(resource = %resource_id))]
    pub async fn release(&self, resource_id: &str) {
        let handle = self.inner.held.lock().unwrap().remove(resource_id);

        let Some(handle) = handle else {
            debug!("resource not held; nothing to release");
            return;
        };

        if let Err(e) = handle.release().await {
            warn!(error = %e, "resource lock release failed");
        }
    }

    /// Releases every resource lock this process holds.
    ///
    /// Each release is attempted independently; one failure never aborts
    /// the rest.
    #[instrument(skip(self))]
    pub async fn release_all(&self) {
        let drained: Vec<(String, B::Handle)> = {
            let mut held = self.inner.held.lock().unwrap();
            held.drain().collect()
        };

        debug!(count = drained.len(), "releasing all resource locks");
        for (resource_id, handle) in drained {
            if let Err(e) = handle.release().await {
                warn!(resource = %resource_id, error = %e, "resource lock release failed");
            }
        }
    }

    /// Queries whether a resource is locked by a live process right now.
    ///
    /// A missing lock file answers false without consulting the backend. A
    /// stale file (present on disk, holder gone) also answers false, as
    /// does any error during the check, so an unclear state never blocks a
    /// legitimate acquisition. No ownership side effects either way.
    #[instrument(skip(self), fields(resource = %resource_id))]
    pub async fn is_locked(&self, resource_id: &str) -> bool {
        let path = self.inner.paths.resource_lock_path(resource_id);
        if !path.exists() {
            return false;
        }

        match self.inner.backend.is_held(&path).await {
            Ok(held) => held,
            Err(e) => {
                debug!(error = %e, "lock status check failed; treating as not locked");
                false
            }
        }
    }

    /// Returns the identifiers of the resources this process holds, sorted.
    pub fn held_resources(&self) -> Vec<String> {
        let mut resources: Vec<String> =
            self.inner.held.lock().unwrap().keys().cloned().collect();
        resources.sort();
        resources
    }
}
