//! OCPP message tracing port
//!
//! Every dispatched command is traced twice: once on the way in and once on
//! the way out. The outbound trace is emitted whatever the handler did.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::charging_station::StationLocation;
use crate::domain::ocpp::{Command, OcppError};

/// Identifies what is being traced.
#[derive(Debug, Clone)]
pub struct TraceContext<'a> {
    pub tenant_id: &'a str,
    pub charging_station_id: &'a str,
    pub command: Command,
    pub location: &'a StationLocation,
}

/// Opaque token carried from the request trace to the response trace.
#[derive(Debug, Clone)]
pub struct TraceHandle {
    pub trace_id: Uuid,
    pub started_at: Instant,
}

impl TraceHandle {
    pub fn start() -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            started_at: Instant::now(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum TraceOutcome<'a> {
    Success(&'a Value),
    Failure(&'a OcppError),
    /// The handler panicked; the panic is resumed after tracing
    Panicked,
}

impl TraceOutcome<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Failure(_) => "error",
            Self::Panicked => "panic",
        }
    }
}

#[async_trait]
pub trait OcppMessageTracer: Send + Sync {
    async fn trace_request(&self, ctx: &TraceContext<'_>, payload: &Value) -> TraceHandle;

    async fn trace_response(
        &self,
        handle: TraceHandle,
        ctx: &TraceContext<'_>,
        payload: &Value,
        outcome: TraceOutcome<'_>,
    );
}
