pub mod manager;

pub use manager::{LockingManager, SharedLockingManager};
