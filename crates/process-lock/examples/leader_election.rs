//! Example: Electing a single leader among contending managers
//!
//! Run with: `cargo run --example leader_election`

use std::time::Duration;

use process_lock::{FileLockBackend, LeaderLock, LockPaths};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let paths = LockPaths::new(std::env::temp_dir().join("process-lock-demo"));

    // Fast retries so the demo hands over quickly; real deployments keep
    // the default five seconds.
    let retry = Duration::from_millis(500);
    let first = LeaderLock::with_backend(&paths, FileLockBackend::new(), retry)?;
    let second = LeaderLock::with_backend(&paths, FileLockBackend::new(), retry)?;

    if first.acquire().await {
        println!("first manager is the leader");
    }

    if !second.acquire().await {
        println!("second manager stays follower and retries in the background");
    }

    tokio::time::sleep(Duration::from_secs(1)).await;

    println!("leader steps down");
    first.release().await;

    // The follower's retry task picks the lock up on its next tick.
    tokio::time::sleep(Duration::from_secs(1)).await;
    println!("second manager is leader now: {}", second.is_leader());

    second.release().await;
    Ok(())
}
