//! Charging station sessions
//!
//! One [`ConnectionSession`] per connected station, plus the registry of
//! live sessions used to reach a station from the central system side.

pub mod client;
pub mod connection;
pub mod identity;
pub mod metrics;
pub mod registry;
pub mod state;

pub use client::{ChargingStationClient, ClientError};
pub use connection::{ConnectionSession, SessionServices};
pub use identity::{HostAffinity, SessionIdentity};
pub use metrics::SessionMetrics;
pub use registry::{SessionRegistry, SharedSessionRegistry};
pub use state::{SessionError, SessionState};
