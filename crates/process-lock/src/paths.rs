//! Lock file locations and naming.

use std::io;
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};

use process_lock_core::error::{LockError, LockResult};

/// Name of the leader lock file inside the base directory.
const LEADER_LOCK_FILE: &str = "leader.lock";

/// Subdirectory of the base directory holding per-resource lock files.
const RESOURCE_LOCK_DIR: &str = "locks";

// ============================================================================
// Lock Paths
// ============================================================================

/// On-disk layout of the lock state directory.
///
/// The base directory holds one fixed-path leader lock file plus a
/// subdirectory with one file per resource lock, named by a deterministic
/// hash of the normalized resource identifier.
#[derive(Debug, Clone)]
pub struct LockPaths {
    base: PathBuf,
}

impl LockPaths {
    /// Creates a layout rooted at an explicit base directory.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Creates a layout under the per-user application state directory.
    ///
    /// Uses the platform state directory where one exists (e.g.
    /// `~/.local/state` on Linux) and falls back to the local data directory
    /// otherwise.
    pub fn for_app(app: &str) -> LockResult<Self> {
        let state = dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .ok_or_else(|| LockError::DirectorySetup {
                path: PathBuf::from(app),
                source: io::Error::new(
                    io::ErrorKind::NotFound,
                    "no per-user state directory on this platform",
                ),
            })?;
        Ok(Self::new(state.join(app)))
    }

    /// Idempotently creates the base directory and the resource lock
    /// subdirectory, including parents.
    ///
    /// The lock managers call this before their first operation; safe to
    /// call repeatedly. Anything other than "already exists" is fatal: the
    /// managers cannot operate without their state directories.
    pub fn ensure(&self) -> LockResult<()> {
        std::fs::create_dir_all(self.resource_lock_dir()).map_err(|e| {
            LockError::DirectorySetup {
                path: self.base.clone(),
                source: e,
            }
        })
    }

    /// Returns the base lock-state directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Returns the fixed path of the leader lock file.
    pub fn leader_lock_path(&self) -> PathBuf {
        self.base.join(LEADER_LOCK_FILE)
    }

    /// Returns the directory holding resource lock files.
    pub fn resource_lock_dir(&self) -> PathBuf {
        self.base.join(RESOURCE_LOCK_DIR)
    }

    /// Returns the lock file path for a resource identifier.
    pub fn resource_lock_path(&self, resource_id: &str) -> PathBuf {
        self.resource_lock_dir().join(lock_file_name(resource_id))
    }
}

// ============================================================================
// Resource Key Hashing
// ============================================================================

/// Maps a resource identifier to its lock file name.
///
/// The identifier is normalized to an absolute path first (relative
/// identifiers resolve against the current directory; `.` and `..`
/// components collapse lexically), so equivalent spellings of the same
/// resource agree on one lock file. The normalized form is then SHA-256
/// hashed, giving a fixed-length filesystem-safe name for any identifier.
/// Stable across process restarts.
pub fn lock_file_name(resource_id: &str) -> String {
    let canonical = normalize(resource_id)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| resource_id.to_string());

    let digest = Sha256::digest(canonical.as_bytes());
    let mut name: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    name.push_str(".lock");
    name
}

/// Lexically absolutizes a path: no filesystem access, no symlink
/// resolution. `None` when a relative path cannot be anchored because the
/// current directory is unknown.
fn normalize(resource_id: &str) -> Option<PathBuf> {
    let raw = Path::new(resource_id);
    let anchored = if raw.is_absolute() {
        raw.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(raw)
    };

    let mut out = PathBuf::new();
    for component in anchored.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(std::path::MAIN_SEPARATOR_STR),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equivalent_identifiers_share_a_name() {
        let cwd = std::env::current_dir().unwrap();
        let relative = lock_file_name("some/codebase");
        let absolute = lock_file_name(cwd.join("some/codebase").to_str().unwrap());
        assert_eq!(relative, absolute);
    }

    #[test]
    fn test_dot_and_parent_components_collapse() {
        assert_eq!(
            lock_file_name("/work/repos/../repos/app"),
            lock_file_name("/work/repos/app")
        );
        assert_eq!(lock_file_name("/a/./b"), lock_file_name("/a/b"));
        assert_eq!(lock_file_name("/a/b/"), lock_file_name("/a/b"));
    }

    #[test]
    fn test_distinct_identifiers_get_distinct_names() {
        assert_ne!(lock_file_name("/work/app-a"), lock_file_name("/work/app-b"));
        assert_ne!(lock_file_name("/work/app"), lock_file_name("/work/app/sub"));
    }

    #[test]
    fn test_names_are_fixed_length_and_filesystem_safe() {
        for id in [
            "/x",
            "/a very long identifier with spaces and ünïcode",
            "relative/path",
        ] {
            let name = lock_file_name(id);
            assert_eq!(name.len(), 64 + ".lock".len());
            assert!(name.ends_with(".lock"));
            assert!(name[..64].chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn test_layout_places_leader_and_resources_under_base() {
        let paths = LockPaths::new("/var/tmp/app");
        assert_eq!(
            paths.leader_lock_path(),
            Path::new("/var/tmp/app/leader.lock")
        );
        assert_eq!(paths.resource_lock_dir(), Path::new("/var/tmp/app/locks"));
        assert!(
            paths
                .resource_lock_path("/work/app")
                .starts_with(paths.resource_lock_dir())
        );
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = LockPaths::new(dir.path().join("nested/state"));
        paths.ensure().unwrap();
        paths.ensure().unwrap();
        assert!(paths.resource_lock_dir().is_dir());
    }

    #[test]
    fn test_for_app_derives_a_per_user_directory() {
        let paths = LockPaths::for_app("process-lock-test").unwrap();
        assert!(paths.base().ends_with("process-lock-test"));
    }
}
