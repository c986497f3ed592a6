use std::fmt;

use thiserror::Error;

/// First constraint failure found in a step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FieldViolation {
    pub step: usize,
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(step: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step,
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct FileSizeViolation {
    pub field: String,
    pub file_name: String,
    pub size: u64,
    pub max_bytes: u64,
}

impl fmt::Display for FileSizeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\" is too large. Maximum file size is {}.",
            self.file_name,
            format_megabytes(self.max_bytes)
        )
    }
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error(transparent)]
    Field(#[from] FieldViolation),
    #[error(transparent)]
    FileSize(#[from] FileSizeViolation),
    #[error("server rejected submission ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("network failure: {0}")]
    Network(#[from] TransportError),
}

/// The request never completed: no status line came back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub fn format_megabytes(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    }
}
