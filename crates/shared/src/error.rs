use thiserror::Error;

use crate::domain::ActuatorCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("raised-hand count must be non-negative, got {count}")]
pub struct InvalidCount {
    pub count: i64,
}

/// Failure reported by a raised-hand signal source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Recoverable hiccup (timeout, disconnect); the next poll may succeed.
    #[error("transient source failure: {0}")]
    Transient(String),
    /// The session cannot be recovered.
    #[error("fatal source failure: {0}")]
    Fatal(String),
    #[error("meeting has been ended by the host")]
    MeetingEnded,
}

impl SourceError {
    pub fn transient(reason: impl Into<String>) -> Self {
        Self::Transient(reason.into())
    }

    pub fn fatal(reason: impl Into<String>) -> Self {
        Self::Fatal(reason.into())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActuatorError {
    #[error("{command} command failed: {reason}")]
    Command {
        command: ActuatorCommand,
        reason: String,
    },
    #[error("failed to reach actuator: {0}")]
    Connect(String),
}

impl ActuatorError {
    pub fn command(command: ActuatorCommand, reason: impl Into<String>) -> Self {
        Self::Command {
            command,
            reason: reason.into(),
        }
    }
}
