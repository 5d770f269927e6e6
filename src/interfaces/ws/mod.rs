//! WebSocket interfaces
//!
//! - `ocpp_server`: OCPP-J WebSocket server
//! - `negotiator`: Protocol version negotiation
//! - `tenant_cache`: Tenant snapshot for handshake checks

pub mod negotiator;
pub mod ocpp_server;
pub mod tenant_cache;

pub use negotiator::ProtocolNegotiator;
pub use ocpp_server::{ConnectionPath, OcppServer};
pub use tenant_cache::TenantCache;
