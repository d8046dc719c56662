use thiserror::Error;

use crate::Timestamp;

/// Construction-time validation errors exposed by `sensorlake-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    EmptyKey { field: &'static str },

    #[error("timestamp must be RFC3339 with an explicit offset: '{value}'")]
    InvalidTimestamp { value: String },
    #[error("timestamp is outside the representable RFC3339 range")]
    TimestampOutOfRange,

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },

    #[error("invalid resource kind '{value}', expected one of device, sensor")]
    InvalidResourceKind { value: String },

    #[error("batch must contain at least one item")]
    EmptyBatch,

    #[error("invalid value for {name}: '{value}'")]
    InvalidConfig { name: &'static str, value: String },
}

/// A selector or response payload that could not be decoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("failed to decode {context}: {message}")]
pub struct DecodeError {
    context: &'static str,
    message: String,
}

impl DecodeError {
    pub fn new(context: &'static str, message: impl Into<String>) -> Self {
        Self {
            context,
            message: message.into(),
        }
    }

    pub fn json(context: &'static str, error: &serde_json::Error) -> Self {
        Self::new(context, error.to_string())
    }

    pub fn context(&self) -> &'static str {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Read window whose start lies after its stop.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("time range start {start} is after stop {stop}")]
pub struct InvalidRangeError {
    pub start: Timestamp,
    pub stop: Timestamp,
}

/// Top-level error type for client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    InvalidRange(#[from] InvalidRangeError),

    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("page fetch failed with status {status}: {message}")]
    PageFetch { status: u16, message: String },

    #[error("cursor holds a continuation token but no segment source")]
    DetachedCursor,
}
