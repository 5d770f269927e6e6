//! Inbound command handlers, per protocol version

pub mod ocpp_v16;

pub use ocpp_v16::OcppV16Handler;
