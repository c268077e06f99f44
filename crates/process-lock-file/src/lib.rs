//! File system backend for process-wide locks.

pub mod backend;
pub mod handle;

pub use backend::FileLockBackend;
pub use handle::FileLockHandle;
