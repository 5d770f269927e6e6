//! OCPP protocol shared types
//!
//! Value objects related to the OCPP protocol that don't belong to a single
//! aggregate: versions and transports, the command catalogue, request
//! headers and call errors.

pub mod command;
pub mod error;
pub mod header;
pub mod version;

pub use command::{Command, UnknownCommand};
pub use error::{OcppError, OcppErrorType};
pub use header::{ConnectionContext, OcppHeader};
pub use version::{OcppVersion, TransportKind};
