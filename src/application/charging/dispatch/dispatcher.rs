//! Command dispatcher
//!
//! One call per inbound command:
//!
//! 1. reject commands outside the inbound allow-list (no trace, no handler)
//! 2. build a fresh [`OcppHeader`] from the live session
//! 3. trace the request
//! 4. look the handler up; unbound commands fail with `NotImplemented`
//! 5. run the handler and trace the response on every exit path

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::registry::SharedHandlerRegistry;
use crate::application::charging::session::SessionState;
use crate::domain::charging_station::StationLocation;
use crate::domain::ocpp::{
    Command, ConnectionContext, OcppError, OcppErrorType, OcppHeader, TransportKind,
};
use crate::domain::ports::{OcppMessageTracer, TraceContext, TraceOutcome};
use crate::domain::{DomainError, DomainResult};

/// What the dispatcher reads from a live session.
#[async_trait]
pub trait SessionContext: Send + Sync {
    fn tenant_id(&self) -> &str;
    fn charging_station_id(&self) -> &str;
    fn transport(&self) -> TransportKind;
    /// Protocol string as negotiated, e.g. `ocpp1.6`
    fn negotiated_version(&self) -> &str;
    fn charging_station_url(&self) -> &str;
    fn token_id(&self) -> Option<&str>;
    fn client_address(&self) -> Option<&str>;
    /// Location known so far, without any lookup.
    fn cached_location(&self) -> StationLocation;
    /// Resolve the connection context, caching the location once known.
    async fn connection_context(&self) -> DomainResult<ConnectionContext>;
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Command '{command}' is not allowed from Charging Station")]
    ProtocolViolation {
        command: String,
        tenant_id: String,
        charging_station_id: String,
        location: StationLocation,
    },

    #[error("OCPP command '{0}' has not been implemented")]
    NotImplemented(Command),

    #[error("Session is {0}, no command accepted")]
    SessionState(SessionState),

    #[error("Connection context unavailable: {0}")]
    Context(#[source] DomainError),

    #[error(transparent)]
    Handler(OcppError),
}

impl RequestError {
    /// OCPP-J CallError code reported to the station.
    pub fn error_code(&self) -> OcppErrorType {
        match self {
            Self::ProtocolViolation { .. } => OcppErrorType::ProtocolError,
            Self::NotImplemented(_) => OcppErrorType::NotImplemented,
            Self::SessionState(_) => OcppErrorType::GenericError,
            Self::Context(_) => OcppErrorType::InternalError,
            Self::Handler(e) => e.code,
        }
    }

    pub fn to_ocpp_error(&self) -> OcppError {
        match self {
            Self::Handler(e) => e.clone(),
            other => OcppError::new(other.error_code(), other.to_string()),
        }
    }
}

pub struct CommandDispatcher {
    registry: SharedHandlerRegistry,
    tracer: Arc<dyn OcppMessageTracer>,
}

impl CommandDispatcher {
    pub fn new(registry: SharedHandlerRegistry, tracer: Arc<dyn OcppMessageTracer>) -> Self {
        Self { registry, tracer }
    }

    pub fn registry(&self) -> &SharedHandlerRegistry {
        &self.registry
    }

    pub async fn dispatch(
        &self,
        session: &dyn SessionContext,
        command_name: &str,
        payload: Value,
    ) -> Result<Value, RequestError> {
        let command = match command_name.parse::<Command>() {
            Ok(command) if command.is_inbound() => command,
            _ => {
                let location = session.cached_location();
                warn!(
                    tenant_id = session.tenant_id(),
                    charging_station_id = session.charging_station_id(),
                    site_id = ?location.site_id,
                    site_area_id = ?location.site_area_id,
                    company_id = ?location.company_id,
                    action = command_name,
                    "Command not allowed from charging station"
                );
                return Err(RequestError::ProtocolViolation {
                    command: command_name.to_string(),
                    tenant_id: session.tenant_id().to_string(),
                    charging_station_id: session.charging_station_id().to_string(),
                    location,
                });
            }
        };

        let header = Self::build_header(session).await?;
        let ctx = TraceContext {
            tenant_id: session.tenant_id(),
            charging_station_id: session.charging_station_id(),
            command,
            location: &header.connection_context.location,
        };
        let trace = self.tracer.trace_request(&ctx, &payload).await;

        let Some(handler) = self.registry.get(command) else {
            let error = RequestError::NotImplemented(command);
            let reported = error.to_ocpp_error();
            self.tracer
                .trace_response(trace, &ctx, &payload, TraceOutcome::Failure(&reported))
                .await;
            return Err(error);
        };

        let outcome = AssertUnwindSafe(handler.handle(&header, &payload))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(result)) => {
                self.tracer
                    .trace_response(trace, &ctx, &payload, TraceOutcome::Success(&result))
                    .await;
                Ok(result)
            }
            Ok(Err(e)) => {
                self.tracer
                    .trace_response(trace, &ctx, &payload, TraceOutcome::Failure(&e))
                    .await;
                Err(RequestError::Handler(e))
            }
            Err(panic) => {
                self.tracer
                    .trace_response(trace, &ctx, &payload, TraceOutcome::Panicked)
                    .await;
                std::panic::resume_unwind(panic)
            }
        }
    }

    async fn build_header(session: &dyn SessionContext) -> Result<OcppHeader, RequestError> {
        let connection_context = session
            .connection_context()
            .await
            .map_err(RequestError::Context)?;
        let transport = session.transport();

        Ok(OcppHeader {
            charge_box_identity: session.charging_station_id().to_string(),
            ocpp_version: transport
                .derive_version(session.negotiated_version())
                .to_string(),
            ocpp_protocol: transport,
            charging_station_url: session.charging_station_url().to_string(),
            tenant_id: session.tenant_id().to_string(),
            token_id: session.token_id().map(str::to_string),
            from_address: session.client_address().map(str::to_string),
            current_ip_address: session.client_address().map(str::to_string),
            connection_context,
        })
    }
}
