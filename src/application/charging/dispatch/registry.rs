//! Command → handler bindings
//!
//! Built once at startup. [`HandlerRegistryBuilder::build`] refuses to
//! produce a registry that leaves any inbound command unbound, so a missing
//! handler is a boot failure rather than a runtime surprise.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::ocpp::{Command, OcppError, OcppHeader};

/// Business logic for one inbound command.
#[async_trait]
pub trait OcppCommandHandler: Send + Sync {
    async fn handle(&self, header: &OcppHeader, payload: &Value) -> Result<Value, OcppError>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no handler bound for inbound commands: {}", format_commands(.0))]
    MissingHandlers(Vec<Command>),

    #[error("command '{0}' is sent by the central system and cannot be handled")]
    NotInbound(Command),
}

fn format_commands(commands: &[Command]) -> String {
    commands
        .iter()
        .map(Command::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct HandlerRegistry {
    handlers: HashMap<Command, Arc<dyn OcppCommandHandler>>,
}

pub type SharedHandlerRegistry = Arc<HandlerRegistry>;

impl HandlerRegistry {
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    pub fn get(&self, command: Command) -> Option<&Arc<dyn OcppCommandHandler>> {
        self.handlers.get(&command)
    }

    /// Inbound commands without a handler, in catalogue order.
    pub fn unbound(&self) -> Vec<Command> {
        Command::INBOUND
            .into_iter()
            .filter(|c| !self.handlers.contains_key(c))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[derive(Default)]
pub struct HandlerRegistryBuilder {
    handlers: HashMap<Command, Arc<dyn OcppCommandHandler>>,
    rejected: Vec<Command>,
}

impl HandlerRegistryBuilder {
    /// Bind `handler` to `command`, replacing any earlier binding.
    pub fn bind(mut self, command: Command, handler: Arc<dyn OcppCommandHandler>) -> Self {
        if command.is_inbound() {
            self.handlers.insert(command, handler);
        } else {
            self.rejected.push(command);
        }
        self
    }

    /// Complete registry: every inbound command must be bound.
    pub fn build(self) -> Result<HandlerRegistry, RegistryError> {
        if let Some(command) = self.rejected.first() {
            return Err(RegistryError::NotInbound(*command));
        }
        let registry = HandlerRegistry {
            handlers: self.handlers,
        };
        let missing = registry.unbound();
        if !missing.is_empty() {
            return Err(RegistryError::MissingHandlers(missing));
        }
        Ok(registry)
    }

    /// Registry serving only what was bound. Unbound inbound commands are
    /// answered with `NotImplemented` at call time.
    pub fn build_partial(self) -> Result<HandlerRegistry, RegistryError> {
        if let Some(command) = self.rejected.first() {
            return Err(RegistryError::NotInbound(*command));
        }
        Ok(HandlerRegistry {
            handlers: self.handlers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl OcppCommandHandler for Echo {
        async fn handle(&self, _header: &OcppHeader, payload: &Value) -> Result<Value, OcppError> {
            Ok(payload.clone())
        }
    }

    fn bind_all(mut builder: HandlerRegistryBuilder, except: &[Command]) -> HandlerRegistryBuilder {
        for command in Command::INBOUND {
            if !except.contains(&command) {
                builder = builder.bind(command, Arc::new(Echo));
            }
        }
        builder
    }

    #[test]
    fn complete_registry_builds() {
        let registry = bind_all(HandlerRegistry::builder(), &[]).build().unwrap();
        assert_eq!(registry.len(), Command::INBOUND.len());
        assert!(registry.unbound().is_empty());
    }

    #[test]
    fn build_lists_every_missing_handler() {
        let err = bind_all(
            HandlerRegistry::builder(),
            &[Command::MeterValues, Command::Authorize],
        )
        .build()
        .err()
        .unwrap();
        assert_eq!(
            err,
            RegistryError::MissingHandlers(vec![Command::Authorize, Command::MeterValues])
        );
        assert_eq!(
            err.to_string(),
            "no handler bound for inbound commands: Authorize, MeterValues"
        );
    }

    #[test]
    fn partial_registry_keeps_gaps() {
        let registry = HandlerRegistry::builder()
            .bind(Command::Heartbeat, Arc::new(Echo))
            .build_partial()
            .unwrap();
        assert!(registry.get(Command::Heartbeat).is_some());
        assert!(registry.get(Command::BootNotification).is_none());
        assert_eq!(registry.unbound().len(), 9);
    }

    #[test]
    fn outbound_commands_cannot_be_bound() {
        let err = bind_all(HandlerRegistry::builder(), &[])
            .bind(Command::Reset, Arc::new(Echo))
            .build()
            .err()
            .unwrap();
        assert_eq!(err, RegistryError::NotInbound(Command::Reset));
    }

    #[tokio::test]
    async fn bound_handler_is_callable() {
        let registry = HandlerRegistry::builder()
            .bind(Command::DataTransfer, Arc::new(Echo))
            .build_partial()
            .unwrap();
        let header = OcppHeader {
            charge_box_identity: "CS-1".into(),
            ocpp_version: "1.6".into(),
            ocpp_protocol: crate::domain::ocpp::TransportKind::Json,
            charging_station_url: "ws://localhost:9000".into(),
            tenant_id: "t1".into(),
            token_id: None,
            from_address: None,
            current_ip_address: None,
            connection_context: Default::default(),
        };
        let out = registry
            .get(Command::DataTransfer)
            .unwrap()
            .handle(&header, &json!({"a": 1}))
            .await
            .unwrap();
        assert_eq!(out, json!({"a": 1}));
    }
}
