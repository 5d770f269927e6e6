//! Inbound command dispatch
//!
//! Allow-list validation, handler lookup, header construction and request /
//! response tracing. Shared by every transport; transports differ only in how
//! the header's bare version number is derived.

pub mod dispatcher;
pub mod registry;
pub mod tracer;

pub use dispatcher::{CommandDispatcher, RequestError, SessionContext};
pub use registry::{
    HandlerRegistry, HandlerRegistryBuilder, OcppCommandHandler, RegistryError,
    SharedHandlerRegistry,
};
pub use tracer::LoggingMessageTracer;
