//! OCPP-J call errors

use std::fmt;

use serde_json::{json, Value};
use thiserror::Error;

/// Error codes defined by OCPP-J for CallError frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OcppErrorType {
    NotImplemented,
    NotSupported,
    InternalError,
    ProtocolError,
    SecurityError,
    FormationViolation,
    PropertyConstraintViolation,
    OccurenceConstraintViolation,
    TypeConstraintViolation,
    GenericError,
}

impl OcppErrorType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotImplemented => "NotImplemented",
            Self::NotSupported => "NotSupported",
            Self::InternalError => "InternalError",
            Self::ProtocolError => "ProtocolError",
            Self::SecurityError => "SecurityError",
            Self::FormationViolation => "FormationViolation",
            Self::PropertyConstraintViolation => "PropertyConstraintViolation",
            // sic: the OCPP-J 1.6 spelling
            Self::OccurenceConstraintViolation => "OccurenceConstraintViolation",
            Self::TypeConstraintViolation => "TypeConstraintViolation",
            Self::GenericError => "GenericError",
        }
    }
}

impl fmt::Display for OcppErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// An error a handler reports back to the station as a CallError.
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct OcppError {
    pub code: OcppErrorType,
    pub message: String,
    pub details: Value,
}

impl OcppError {
    pub fn new(code: OcppErrorType, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: json!({}),
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    pub fn formation_violation(message: impl Into<String>) -> Self {
        Self::new(OcppErrorType::FormationViolation, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(OcppErrorType::InternalError, message)
    }
}
