//! Device-facing transports

pub mod ws;
