//! Periodic per-tenant maintenance

pub mod check_charging_station_template;
pub mod task;

pub use check_charging_station_template::{CheckChargingStationTemplateTask, TemplateRunSummary};
pub use task::{TaskError, TenantScheduler, TenantSchedulerTask};
