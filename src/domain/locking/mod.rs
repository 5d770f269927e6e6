//! Locking aggregate
//!
//! Tenant-scoped exclusive locks shared by every backend instance.

pub mod model;
pub mod repository;

pub use model::{Lock, LockAction, LockEntity, LockError, LockRecord, LockType};
pub use repository::LockRepository;
