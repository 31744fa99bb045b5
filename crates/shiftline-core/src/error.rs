use serde::Serialize;
use thiserror::Error;

use crate::types::ShiftKey;

#[derive(Debug, Error)]
pub enum ShiftlineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid time window: {start} .. {end}")]
    InvalidWindow { start: String, end: String },

    #[error("Unknown cache kind: {0}")]
    UnknownCacheKind(String),

    #[error("Parse failure: {0}")]
    Parse(#[from] ParseFailure),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShiftlineError {
    /// Short error code string for logs and the rendering layer.
    pub fn code(&self) -> &'static str {
        match self {
            ShiftlineError::Config(_) => "CONFIG_ERROR",
            ShiftlineError::InvalidWindow { .. } => "INVALID_WINDOW",
            ShiftlineError::UnknownCacheKind(_) => "UNKNOWN_CACHE_KIND",
            ShiftlineError::Parse(_) => "PARSE_FAILURE",
            ShiftlineError::Serialization(_) => "SERIALIZATION_ERROR",
            ShiftlineError::Io(_) => "IO_ERROR",
            ShiftlineError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, ShiftlineError>;

/// A field of a shift record that could not be interpreted.
///
/// Never fatal: the record is skipped by whichever stage hit it and the
/// failure is collected into that stage's report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("shift {key}: cannot use {field} {value:?}: {reason}")]
pub struct ParseFailure {
    pub key: ShiftKey,
    pub field: &'static str,
    pub value: String,
    pub reason: String,
}

impl ParseFailure {
    pub fn new(
        key: ShiftKey,
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            key,
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }
}
