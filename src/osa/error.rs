use std::time::Duration;
use thiserror::Error;

/// Broad classification used by callers and tests to tell failures apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Interpreter could not run, exited non-zero, or timed out
    Process,
    /// Interpreter succeeded but wrote to stderr under a strict policy
    Warning,
    /// Output did not have the shape the domain expects
    Malformed,
    /// Rejected before any script ran
    InvalidInput,
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("script '{operation}' exited with {}: {stderr}", describe_code(.code))]
    ExitFailure {
        operation: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("script '{operation}' timed out after {}ms", .after.as_millis())]
    Timeout { operation: String, after: Duration },

    #[error("script '{operation}' reported a warning: {stderr}")]
    InterpreterWarning { operation: String, stderr: String },

    #[error("malformed {kind} record: expected {expected} fields, found {found}")]
    MalformedRecord {
        kind: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("malformed {kind} record: field '{field}' {reason}")]
    InvalidField {
        kind: &'static str,
        field: &'static str,
        reason: String,
    },

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl BridgeError {
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        BridgeError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            BridgeError::Spawn { .. }
            | BridgeError::ExitFailure { .. }
            | BridgeError::Timeout { .. } => FailureKind::Process,
            BridgeError::InterpreterWarning { .. } => FailureKind::Warning,
            BridgeError::MalformedRecord { .. } | BridgeError::InvalidField { .. } => {
                FailureKind::Malformed
            }
            BridgeError::InvalidParameter { .. } => FailureKind::InvalidInput,
        }
    }
}
