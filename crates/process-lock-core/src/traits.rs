//! Core traits for process-wide locks.

use std::future::Future;
use std::path::Path;

use crate::error::LockResult;

// ============================================================================
// Lock Handle Trait
// ============================================================================

/// Handle to a held lock.
///
/// Dropping this handle releases the lock best-effort. For proper error
/// handling in async contexts, call `release()` explicitly.
///
/// # Example
///
/// ```rust,ignore
/// if let Some(handle) = backend.try_lock(&path).await? {
///     // Critical section - we hold the lock
///     do_work().await;
///     // Explicit release with error handling
///     handle.release().await?;
/// }
/// ```
pub trait LockHandle: Send + Sync + Sized {
    /// Returns the path of the lock file this handle holds.
    fn path(&self) -> &Path;

    /// Explicitly releases the lock.
    ///
    /// This is also called automatically on drop, but the async version
    /// allows proper error handling.
    fn release(self) -> impl Future<Output = LockResult<()>> + Send;
}

// ============================================================================
// Lock Backend Trait
// ============================================================================

/// An advisory locking mechanism bound to filesystem paths.
///
/// Provides exclusive access to a resource identified by a lock-file path
/// across processes on the same host. The backend determines the actual
/// mechanism (OS advisory locks in production, in-memory state in tests).
/// Acquisition never waits: a held lock is reported as unavailable, not
/// retried internally.
///
/// # Example
///
/// ```rust,ignore
/// use process_lock_core::LockBackend;
///
/// async fn guarded(backend: &impl LockBackend, path: &Path) -> LockResult<bool> {
///     match backend.try_lock(path).await? {
///         Some(handle) => {
///             perform_critical_section().await;
///             handle.release().await?;
///             Ok(true)
///         }
///         None => Ok(false), // held by another process
///     }
/// }
/// ```
pub trait LockBackend: Send + Sync {
    /// The handle type returned when a lock is acquired.
    type Handle: LockHandle + Send;

    /// Attempts to acquire the lock without waiting.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(handle))` - Lock acquired successfully
    /// * `Ok(None)` - Lock is held by another process
    /// * `Err(...)` - Error occurred during the attempt
    fn try_lock(
        &self,
        path: &Path,
    ) -> impl Future<Output = LockResult<Option<Self::Handle>>> + Send;

    /// Queries whether the lock is actively held by a live process.
    ///
    /// Distinct from "a lock file exists on disk": a file left behind by a
    /// crashed holder reports `false`. The query has no ownership side
    /// effects.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - A live process currently holds the lock
    /// * `Ok(false)` - Nobody holds it (file missing or stale)
    /// * `Err(...)` - The status could not be determined
    fn is_held(&self, path: &Path) -> impl Future<Output = LockResult<bool>> + Send;
}
