//! Device-facing charging station core: sessions, dispatch, handlers

pub mod dispatch;
pub mod handlers;
pub mod services;
pub mod session;

pub use dispatch::{CommandDispatcher, HandlerRegistry, LoggingMessageTracer, RequestError};
pub use services::ChargingStationService;
pub use session::{ConnectionSession, SessionRegistry, SessionServices, SharedSessionRegistry};
