//! Example: Guarding exclusive access to a checked-out codebase
//!
//! Run with: `cargo run --example codebase_lock`

use std::time::Duration;

use process_lock::{LeaderLock, LockPaths, ResourceLocks, ShutdownCoordinator};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let paths = LockPaths::new(std::env::temp_dir().join("process-lock-demo"));

    let resources = ResourceLocks::new(&paths)?;
    let leader = LeaderLock::new(&paths)?;

    // Release everything if the process is interrupted.
    let coordinator = ShutdownCoordinator::new(resources.clone(), leader.clone());
    coordinator.spawn();

    let codebase = "/work/repos/example-app";
    if resources.acquire(codebase).await {
        println!("working on {codebase} exclusively");

        // Do some work while holding the lock
        tokio::time::sleep(Duration::from_secs(2)).await;
        println!("work completed");
    } else {
        println!("{codebase} is being worked on by another process");
    }

    let also_locked = resources.is_locked("/work/repos/other-app").await;
    println!("other-app locked elsewhere: {also_locked}");

    // Normal-exit path: resources first, leader last.
    coordinator.shutdown().await;
    println!("all locks released");
    Ok(())
}
