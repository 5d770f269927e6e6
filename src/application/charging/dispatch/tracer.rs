//! Default OCPP message tracer
//!
//! Logs every request (`>>`) and response (`<<`) with the station's tenant and
//! site context, and records Prometheus metrics:
//!
//! - **`ocpp_requests_total`**: counter with labels `action`, `outcome`
//! - **`ocpp_request_duration_seconds`**: histogram with label `action`

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::domain::ports::{OcppMessageTracer, TraceContext, TraceHandle, TraceOutcome};

#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMessageTracer;

impl LoggingMessageTracer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OcppMessageTracer for LoggingMessageTracer {
    async fn trace_request(&self, ctx: &TraceContext<'_>, payload: &Value) -> TraceHandle {
        let handle = TraceHandle::start();
        info!(
            trace_id = %handle.trace_id,
            tenant_id = ctx.tenant_id,
            charging_station_id = ctx.charging_station_id,
            site_id = ?ctx.location.site_id,
            site_area_id = ?ctx.location.site_area_id,
            company_id = ?ctx.location.company_id,
            action = %ctx.command.server_action(),
            payload = %payload,
            ">> {}",
            ctx.command
        );
        handle
    }

    async fn trace_response(
        &self,
        handle: TraceHandle,
        ctx: &TraceContext<'_>,
        _payload: &Value,
        outcome: TraceOutcome<'_>,
    ) {
        let duration = handle.started_at.elapsed();
        metrics::counter!(
            "ocpp_requests_total",
            "action" => ctx.command.as_str(),
            "outcome" => outcome.label()
        )
        .increment(1);
        metrics::histogram!("ocpp_request_duration_seconds", "action" => ctx.command.as_str())
            .record(duration.as_secs_f64());

        let duration_ms = duration.as_millis() as u64;
        match outcome {
            TraceOutcome::Success(result) => info!(
                trace_id = %handle.trace_id,
                tenant_id = ctx.tenant_id,
                charging_station_id = ctx.charging_station_id,
                action = %ctx.command.server_action(),
                duration_ms,
                result = %result,
                "<< {}",
                ctx.command
            ),
            TraceOutcome::Failure(e) => warn!(
                trace_id = %handle.trace_id,
                tenant_id = ctx.tenant_id,
                charging_station_id = ctx.charging_station_id,
                action = %ctx.command.server_action(),
                duration_ms,
                error = %e,
                "<< {} failed",
                ctx.command
            ),
            TraceOutcome::Panicked => error!(
                trace_id = %handle.trace_id,
                tenant_id = ctx.tenant_id,
                charging_station_id = ctx.charging_station_id,
                action = %ctx.command.server_action(),
                duration_ms,
                "<< {} panicked",
                ctx.command
            ),
        }
    }
}
