use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("contact not found: {0}")]
    NotFound(String),

    #[error("contact store error: {0}")]
    Storage(String),
}

/// Broad origin of a core failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreErrorKind {
    /// Connectivity, server or timeout problems.
    Network,
    /// The peer or the protocol refused the operation.
    Protocol,
    /// The operation was stopped through `stop_ongoing_process`.
    Aborted,
}

/// Failure returned by a blocking core call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CoreError {
    pub kind: CoreErrorKind,
    pub message: String,
}

impl CoreError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: CoreErrorKind::Network,
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self {
            kind: CoreErrorKind::Protocol,
            message: message.into(),
        }
    }

    pub fn aborted() -> Self {
        Self {
            kind: CoreErrorKind::Aborted,
            message: "aborted".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("token storage error: {0}")]
    Storage(String),
}
