//! Core traits and types for process-wide locks.

pub mod error;
pub mod prelude;
pub mod traits;

pub use error::{LockError, LockResult};
pub use prelude::*;
