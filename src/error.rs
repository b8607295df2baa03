//! Error types for the endpoint core.
//!
//! Parsing never fails: malformed or unrecognized directives silently fall
//! back to defaults. Every variant here is a request-time failure and occurs
//! before any query result is returned, so no partial rows ever escape.

use crate::params::ParamType;
use crate::request::HttpMethod;
use thiserror::Error;

/// Failures surfaced by the request pipeline.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// Request verb does not match the method declared for the query.
    #[error("method not allowed: endpoint accepts {expected}, got {actual}")]
    MethodNotAllowed {
        expected: HttpMethod,
        actual: String,
    },

    /// The configured auth requirement rejected the request.
    #[error("unauthorized")]
    Unauthorized,

    /// A request value could not be coerced to its declared type.
    #[error("invalid value {raw:?} for parameter '{name}' of type {ty}")]
    InvalidParameterValue {
        name: String,
        ty: ParamType,
        raw: String,
    },

    /// The query-execution gateway failed. The core does not retry; retry
    /// policy belongs to the gateway implementation.
    #[error("query execution failed: {message}")]
    Execution {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl EndpointError {
    /// Create a method mismatch error.
    pub fn method_not_allowed(expected: HttpMethod, actual: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            expected,
            actual: actual.into(),
        }
    }

    /// Create a coercion failure for a named parameter.
    pub fn invalid_value(name: impl Into<String>, ty: ParamType, raw: impl Into<String>) -> Self {
        Self::InvalidParameterValue {
            name: name.into(),
            ty,
            raw: raw.into(),
        }
    }

    /// Create an execution error without an underlying source.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution {
            message: msg.into(),
            source: None,
        }
    }

    /// Wrap a gateway failure, keeping it as the error source.
    pub fn from_gateway(source: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Execution {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// HTTP status this error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MethodNotAllowed { .. } => 405,
            Self::Unauthorized => 401,
            Self::InvalidParameterValue { .. } => 400,
            Self::Execution { .. } => 500,
        }
    }

    /// Check whether the caller is at fault, as opposed to the gateway.
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}
