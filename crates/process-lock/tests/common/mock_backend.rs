//! Mock backend for testing manager behavior without OS locks.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use process_lock::{LockBackend, LockError, LockHandle, LockResult};

/// Mock lock backend that tracks held paths in memory and records every
/// release in the order it happened.
#[derive(Clone, Default)]
pub struct MockLockBackend {
    state: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    held: Mutex<HashSet<PathBuf>>,
    fail_release: Mutex<HashSet<PathBuf>>,
    released: Mutex<Vec<PathBuf>>,
}

impl MockLockBackend {
    /// Creates a new mock backend with no locks held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every release of `path` report an error. The lock still comes
    /// off; only the reported result fails.
    pub fn fail_release_of(&self, path: &Path) {
        self.state
            .fail_release
            .lock()
            .unwrap()
            .insert(path.to_path_buf());
    }

    /// Paths released so far, in release order.
    pub fn released(&self) -> Vec<PathBuf> {
        self.state.released.lock().unwrap().clone()
    }

    /// Whether the mock currently records `path` as locked.
    pub fn holds(&self, path: &Path) -> bool {
        self.state.held.lock().unwrap().contains(path)
    }
}

/// Mock lock handle produced by [`MockLockBackend`].
pub struct MockLockHandle {
    path: PathBuf,
    state: Arc<MockState>,
}

impl LockHandle for MockLockHandle {
    fn path(&self) -> &Path {
        &self.path
    }

    async fn release(self) -> LockResult<()> {
        self.state.held.lock().unwrap().remove(&self.path);
        self.state.released.lock().unwrap().push(self.path.clone());

        if self.state.fail_release.lock().unwrap().contains(&self.path) {
            return Err(LockError::Release {
                path: self.path.clone(),
                source: std::io::Error::other("simulated release failure"),
            });
        }
        Ok(())
    }
}

impl LockBackend for MockLockBackend {
    type Handle = MockLockHandle;

    async fn try_lock(&self, path: &Path) -> LockResult<Option<Self::Handle>> {
        let mut held = self.state.held.lock().unwrap();
        if held.contains(path) {
            return Ok(None);
        }

        held.insert(path.to_path_buf());
        Ok(Some(MockLockHandle {
            path: path.to_path_buf(),
            state: Arc::clone(&self.state),
        }))
    }

    async fn is_held(&self, path: &Path) -> LockResult<bool> {
        Ok(self.state.held.lock().unwrap().contains(path))
    }
}
