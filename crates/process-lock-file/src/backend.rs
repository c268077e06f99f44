//! File-based advisory lock backend.

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::Path;

use fs2::FileExt;
use tracing::{Span, instrument};

use process_lock_core::error::{LockError, LockResult};
use process_lock_core::traits::LockBackend;

use crate::handle::FileLockHandle;

/// How many times to restart an acquisition when the lock file is unlinked
/// or replaced between opening and locking it.
const MAX_ACQUIRE_ATTEMPTS: u32 = 16;

/// Advisory lock backend built on OS file locks (`flock` on Unix).
///
/// The kernel drops these locks automatically when the owning process
/// terminates, so a crashed holder leaves behind only a stale file that the
/// next acquisition attempt takes over.
#[derive(Debug, Default, Clone)]
pub struct FileLockBackend;

impl FileLockBackend {
    /// Creates a new file lock backend.
    pub fn new() -> Self {
        Self
    }

    fn open_lock_file(path: &Path, create: bool) -> io::Result<File> {
        // We DON'T use truncate(true) here to avoid race conditions where a
        // waiting process might truncate a held lock file.
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(create)
            .truncate(false)
            .open(path)
    }
}

fn is_contention(e: &io::Error) -> bool {
    e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// Checks that the locked file is still what the path names.
///
/// A holder releases by unlinking the file before unlocking it; locking an
/// inode that has already vanished from the path excludes nobody.
#[cfg(unix)]
fn same_file_on_disk(file: &File, path: &Path) -> LockResult<bool> {
    use std::os::unix::fs::MetadataExt;

    let held = file
        .metadata()
        .map_err(|e| LockError::Backend(Box::new(e)))?;
    let on_disk = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(LockError::Backend(Box::new(e))),
    };

    Ok(held.dev() == on_disk.dev() && held.ino() == on_disk.ino())
}

/// Windows keeps a locked file in place until every handle is closed, so the
/// unlink race cannot occur there.
#[cfg(not(unix))]
fn same_file_on_disk(_file: &File, _path: &Path) -> LockResult<bool> {
    Ok(true)
}

impl LockBackend for FileLockBackend {
    type Handle = FileLockHandle;

    #[instrument(
        skip(self),
        fields(lock.path = %path.display(), backend = "file", acquired = tracing::field::Empty)
    )]
    async fn try_lock(&self, path: &Path) -> LockResult<Option<FileLockHandle>> {
        for _ in 0..MAX_ACQUIRE_ATTEMPTS {
            let file = Self::open_lock_file(path, true).map_err(|e| LockError::Open {
                path: path.to_path_buf(),
                source: e,
            })?;

            match file.try_lock_exclusive() {
                Ok(()) => {}
                Err(e) if is_contention(&e) => {
                    Span::current().record("acquired", false);
                    return Ok(None);
                }
                Err(e) => return Err(LockError::Backend(Box::new(e))),
            }

            if !same_file_on_disk(&file, path)? {
                drop(file);
                continue;
            }

            Span::current().record("acquired", true);
            return Ok(Some(FileLockHandle::new(file, path.to_path_buf())));
        }

        Err(LockError::Backend(Box::new(io::Error::other(format!(
            "lock file '{}' kept changing during acquisition",
            path.display()
        )))))
    }

    #[instrument(skip(self), fields(lock.path = %path.display(), backend = "file"))]
    async fn is_held(&self, path: &Path) -> LockResult<bool> {
        let file = match Self::open_lock_file(path, false) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(LockError::Open {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };

        match file.try_lock_exclusive() {
            Ok(()) => {
                // Nobody live holds it; the file is stale. Drop the probe
                // lock without touching the file itself.
                let _ = fs2::FileExt::unlock(&file);
                Ok(false)
            }
            Err(e) if is_contention(&e) => Ok(true),
            Err(e) => Err(LockError::Backend(Box::new(e))),
        }
    }
}
