//! Integration tests for leader election between lock managers.

use std::time::Duration;

use process_lock::{FileLockBackend, LeaderLock, LockPaths};
use tempfile::TempDir;

/// Short retry interval so takeover tests finish quickly.
const TEST_RETRY: Duration = Duration::from_millis(50);

fn leader_in(dir: &TempDir) -> LeaderLock {
    LeaderLock::with_backend(
        &LockPaths::new(dir.path()),
        FileLockBackend::new(),
        TEST_RETRY,
    )
    .unwrap()
}

/// Polls until `cond` holds, panicking after a couple of seconds.
async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..100 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn test_acquire_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let leader = leader_in(&dir);

    assert!(!leader.is_leader());
    assert!(leader.acquire().await);
    assert!(leader.is_leader());

    // Acquiring again while leading is a no-op that stays leader.
    assert!(leader.acquire().await);
    assert!(leader.is_leader());
}

#[tokio::test]
async fn test_single_leader_among_contenders() {
    let dir = TempDir::new().unwrap();
    let first = leader_in(&dir);
    let second = leader_in(&dir);

    assert!(first.acquire().await);
    assert!(
        !second.acquire().await,
        "second contender must stay follower"
    );
    assert!(!second.is_leader());
    assert!(second.retry_scheduled());

    // Once the leader steps down, the loser's retry task takes over.
    first.release().await;
    assert!(!first.is_leader());

    wait_until(|| second.is_leader()).await;
    assert!(
        !second.retry_scheduled(),
        "retry task should stop after winning"
    );
}

#[tokio::test]
async fn test_release_is_a_follower_no_op() {
    let dir = TempDir::new().unwrap();
    let leader = leader_in(&dir);

    // Never acquired; release must do nothing.
    leader.release().await;
    assert!(!leader.is_leader());

    // The leader slot stays usable afterwards.
    assert!(leader.acquire().await);
}

#[tokio::test]
async fn test_failed_acquire_schedules_retry() {
    let dir = TempDir::new().unwrap();
    let holder = leader_in(&dir);
    let contender = leader_in(&dir);

    assert!(holder.acquire().await);

    assert!(!contender.acquire().await);
    assert!(contender.retry_scheduled());

    // Repeated failed attempts reuse the existing retry task.
    assert!(!contender.acquire().await);
    assert!(contender.retry_scheduled());
}

#[tokio::test]
async fn test_stale_leader_file_is_taken_over() {
    let dir = TempDir::new().unwrap();
    let paths = LockPaths::new(dir.path());
    paths.ensure().unwrap();

    // A crashed holder leaves the file behind but the kernel has already
    // dropped its lock.
    std::fs::write(paths.leader_lock_path(), b"crashed holder").unwrap();

    let leader = leader_in(&dir);
    assert!(leader.acquire().await, "stale file must not block election");
}

#[tokio::test]
async fn test_lock_path_reports_location() {
    let dir = TempDir::new().unwrap();
    let paths = LockPaths::new(dir.path());
    let leader = LeaderLock::new(&paths).unwrap();

    assert_eq!(leader.lock_path(), paths.leader_lock_path());
}

#[tokio::test]
async fn test_clones_share_state() {
    let dir = TempDir::new().unwrap();
    let leader = leader_in(&dir);
    let view = leader.clone();

    assert!(leader.acquire().await);
    assert!(view.is_leader());

    view.release().await;
    assert!(!leader.is_leader());
}
