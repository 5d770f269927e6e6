//! Domain ports (hexagonal architecture boundaries)

pub mod tracer;

pub use tracer::{OcppMessageTracer, TraceContext, TraceHandle, TraceOutcome};
