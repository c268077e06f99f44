//! Single-machine mutual exclusion for multi-process applications.
//!
//! Two primitives cover the usual "many processes, one host" coordination
//! needs: a process-wide **leader lock** so exactly one running instance
//! performs a privileged role, and per-resource **exclusive locks** so
//! concurrent processes never operate on the same external resource at the
//! same time. Both sit on OS advisory file locks, which the kernel releases
//! automatically if the owning process dies.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use process_lock::{LeaderLock, LockPaths, ResourceLocks, ShutdownCoordinator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let paths = LockPaths::for_app("my-app")?;
//!
//!     let leader = LeaderLock::new(&paths)?;
//!     let resources = ResourceLocks::new(&paths)?;
//!
//!     // Release everything on ctrl-c / SIGTERM.
//!     let coordinator = ShutdownCoordinator::new(resources.clone(), leader.clone());
//!     coordinator.spawn();
//!
//!     if leader.acquire().await {
//!         println!("this instance is the leader");
//!     } // otherwise a background retry keeps trying every 5 seconds
//!
//!     if resources.acquire("/work/repos/app").await {
//!         // Exclusive access to the resource
//!         resources.release("/work/repos/app").await;
//!     }
//!
//!     // Normal-exit path
//!     coordinator.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # How it works
//!
//! Lock state lives in one directory: a fixed `leader.lock` file plus a
//! `locks/` subdirectory with one file per resource, named by a hash of the
//! normalized resource identifier. Every acquisition is a single
//! non-blocking attempt; contention is a `false` return, never an error and
//! never a blocking wait. A crashed process leaves only a stale file
//! behind, which probes as unlocked and which the next acquisition takes
//! over.
//!
//! # Crate Organization
//!
//! This is the facade crate, re-exporting:
//! - `process-lock-core`: backend traits and error types
//! - `process-lock-file`: the OS advisory file lock backend

pub mod leader;
pub mod paths;
pub mod resources;
pub mod shutdown;

pub use leader::{DEFAULT_RETRY_INTERVAL, LeaderLock};
pub use paths::{LockPaths, lock_file_name};
pub use resources::ResourceLocks;
pub use shutdown::ShutdownCoordinator;

// Re-export the trait and error surface
pub use process_lock_core::*;

// Re-export the default backend
pub use process_lock_file::{FileLockBackend, FileLockHandle};
