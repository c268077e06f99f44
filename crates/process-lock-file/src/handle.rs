//! File lock handle implementation.

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{instrument, warn};

use process_lock_core::error::{LockError, LockResult};
use process_lock_core::traits::LockHandle;

/// Handle for a held file lock.
///
/// Dropping this handle releases the lock and deletes the lock file.
pub struct FileLockHandle {
    /// The locked file. `None` once released.
    file: Option<File>,
    /// Path to the lock file (for cleanup).
    path: PathBuf,
}

impl FileLockHandle {
    pub(crate) fn new(file: File, path: PathBuf) -> Self {
        Self {
            file: Some(file),
            path,
        }
    }

    /// Removes the lock file, then drops the OS lock.
    ///
    /// The file is unlinked while the lock is still held so that a waiting
    /// process can never lock an inode that no longer backs the path.
    fn release_inner(&mut self) -> LockResult<()> {
        let Some(file) = self.file.take() else {
            return Ok(());
        };

        let remove_result = std::fs::remove_file(&self.path);
        let unlock_result = fs2::FileExt::unlock(&file);

        match remove_result {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(LockError::Release {
                    path: self.path.clone(),
                    source: e,
                });
            }
        }

        unlock_result.map_err(|e| LockError::Release {
            path: self.path.clone(),
            source: e,
        })
    }
}

impl LockHandle for FileLockHandle {
    fn path(&self) -> &Path {
        &self.path
    }

    #[instrument(skip(self), fields(lock.path = %self.path.display(), backend = "file"))]
    async fn release(mut self) -> LockResult<()> {
        self.release_inner()
    }
}

impl Drop for FileLockHandle {
    fn drop(&mut self) {
        if let Err(e) = self.release_inner() {
            warn!(error = %e, "failed to release file lock on drop");
        }
    }
}
