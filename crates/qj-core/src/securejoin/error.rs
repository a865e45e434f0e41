use thiserror::Error;

use super::HandshakeState;
use crate::ids::ChatId;
use crate::progress::FailureCause;

/// Why a handshake did not produce a chat.
///
/// `AlreadyInProgress` is returned from `begin_handshake`; the other
/// variants are derived from a terminal [`HandshakeState`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeError {
    #[error("a secure-join handshake is already in progress")]
    AlreadyInProgress,

    #[error("secure-join was cancelled")]
    Cancelled,

    #[error("{0}")]
    PeerRejected(String),

    #[error("{0}")]
    TransportError(String),
}

pub type HandshakeOutcome = Result<ChatId, HandshakeError>;

impl HandshakeState {
    /// Outcome of a terminal state, `None` while still running.
    pub fn outcome(&self) -> Option<HandshakeOutcome> {
        match self {
            HandshakeState::Succeeded { chat_id } => Some(Ok(*chat_id)),
            HandshakeState::Failed { message, cause } => Some(Err(match cause {
                FailureCause::Transport => HandshakeError::TransportError(message.clone()),
                FailureCause::Peer => HandshakeError::PeerRejected(message.clone()),
            })),
            HandshakeState::Cancelled => Some(Err(HandshakeError::Cancelled)),
            _ => None,
        }
    }
}
