//! # OCPP Gateway
//!
//! Device-facing OCPP gateway for a multi-tenant charging station backend.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Core entities, value objects and ports
//! - **application**: Connection sessions, command dispatch, handlers,
//!   locking, the tenant scheduler and pricing
//! - **infrastructure**: Database, in-memory storage, template resolver
//! - **interfaces**: OCPP-J WebSocket server
//! - **shared**: Errors, OCPP-J framing, shutdown signal

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod shared;

pub use config::{config_path_from_env, default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, run_migrations, DatabaseConfig, SeaOrmRepositoryProvider};

pub use interfaces::ws::OcppServer;
