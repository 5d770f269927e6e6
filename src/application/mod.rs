pub mod charging;
pub mod locking;
pub mod pricing;
pub mod scheduler;

// Re-export key types for convenience
pub use charging::{
    ChargingStationService, CommandDispatcher, ConnectionSession, HandlerRegistry,
    SessionRegistry, SessionServices, SharedSessionRegistry,
};
pub use locking::{LockingManager, SharedLockingManager};
pub use pricing::{BuiltInPricingIntegration, SimplePricingSettings};
pub use scheduler::{CheckChargingStationTemplateTask, TenantScheduler, TenantSchedulerTask};
