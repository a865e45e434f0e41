use serde::{Deserialize, Serialize};

use super::Permille;
use crate::ids::{ChatId, ContactId, OperationId};

/// Background operations that share the progress bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    SecureJoin,
    Configure,
    ImportExport,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SecureJoin => "secure_join",
            Self::Configure => "configure",
            Self::ImportExport => "import_export",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureCause {
    /// Network or server trouble, including local timeouts.
    Transport,
    /// The peer or the protocol refused.
    Peer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressPayload {
    /// Intermediate stage. For secure-join, `peer` is set from the
    /// midpoint stage on.
    StageUpdate {
        permille: Permille,
        peer: Option<ContactId>,
    },
    /// Terminal failure with user-facing text.
    Failure { message: String, cause: FailureCause },
    /// Terminal success. Secure-join carries the resulting chat.
    Success { chat_id: Option<ChatId> },
}

impl ProgressPayload {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::StageUpdate { .. })
    }
}

/// One notification published by the progress bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub operation_id: OperationId,
    pub kind: OperationKind,
    pub payload: ProgressPayload,
}
