//! Secure-join handshake state machine.
//!
//! Pure transition function driven by the joiner's progress stream. It has
//! no side effects; the engine in the application layer executes the
//! returned actions.

use serde::{Deserialize, Serialize};

use crate::ids::{ChatId, ContactId};
use crate::progress::{FailureCause, Permille, UNKNOWN_ERROR};

/// Stage at which the inviter has verified us and its contact id is known.
pub const PEER_VERIFIED_STAGE: u16 = 400;

/// Handshake state as seen by the joiner.
///
/// 加入方视角的握手状态。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandshakeState {
    NotStarted,
    /// Request sent, nothing heard back yet.
    ///
    /// 已发出请求，等待对方响应。
    AwaitingPeerConfirmation,
    /// The inviter answered and keys are being checked.
    ///
    /// 对方已响应，正在校验密钥。
    Verifying,
    /// The inviter is verified; we are now introducing ourselves.
    ///
    /// 对方已验证，正在介绍自己。
    IntroducingSelf { peer: Option<ContactId> },
    Succeeded { chat_id: ChatId },
    Failed { message: String, cause: FailureCause },
    Cancelled,
}

impl HandshakeState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded { .. } | Self::Failed { .. } | Self::Cancelled
        )
    }

    pub fn is_running(&self) -> bool {
        !self.is_terminal() && *self != Self::NotStarted
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::AwaitingPeerConfirmation => "awaiting_peer_confirmation",
            Self::Verifying => "verifying",
            Self::IntroducingSelf { .. } => "introducing_self",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Inputs of the handshake state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandshakeEvent {
    /// The core call was started.
    Start,
    /// Joiner progress reported by the core.
    Progress {
        permille: Permille,
        peer: Option<ContactId>,
    },
    /// The core call returned a chat.
    Succeeded { chat_id: ChatId },
    Failed { message: String, cause: FailureCause },
    /// The user gave up.
    Cancel,
    /// The local watchdog fired.
    TimedOut,
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandshakeAction {
    /// Ask the core to abort the blocking join call.
    StopCoreProcess,
    /// Surface the verified inviter, e.g. "verified with Alice".
    AnnouncePeer { peer: ContactId },
}

pub struct HandshakeStateMachine;

impl HandshakeStateMachine {
    pub fn transition(
        state: HandshakeState,
        event: HandshakeEvent,
    ) -> (HandshakeState, Vec<HandshakeAction>) {
        use HandshakeState as S;

        if state.is_terminal() {
            return (state, Vec::new());
        }

        match (state, event) {
            (S::NotStarted, HandshakeEvent::Start) => (S::AwaitingPeerConfirmation, Vec::new()),
            (S::NotStarted, HandshakeEvent::Cancel) => (S::Cancelled, Vec::new()),
            (S::NotStarted, _) => (S::NotStarted, Vec::new()),

            (state, HandshakeEvent::Progress { permille, peer }) => {
                Self::on_progress(state, permille, peer)
            }
            (_, HandshakeEvent::Succeeded { chat_id }) => (S::Succeeded { chat_id }, Vec::new()),
            (_, HandshakeEvent::Failed { message, cause }) => {
                (S::Failed { message, cause }, Vec::new())
            }
            (_, HandshakeEvent::Cancel) => (S::Cancelled, vec![HandshakeAction::StopCoreProcess]),
            (_, HandshakeEvent::TimedOut) => (
                S::Failed {
                    message: "timeout".to_string(),
                    cause: FailureCause::Transport,
                },
                vec![HandshakeAction::StopCoreProcess],
            ),
            (state, HandshakeEvent::Start) => (state, Vec::new()),
        }
    }

    fn on_progress(
        state: HandshakeState,
        permille: Permille,
        peer: Option<ContactId>,
    ) -> (HandshakeState, Vec<HandshakeAction>) {
        use HandshakeState as S;

        if permille.is_failure() {
            return (
                S::Failed {
                    message: UNKNOWN_ERROR.to_string(),
                    cause: FailureCause::Peer,
                },
                Vec::new(),
            );
        }
        // Completion needs the chat id, which only the returning call has.
        if permille.is_done() {
            return (state, Vec::new());
        }

        if permille.get() < PEER_VERIFIED_STAGE {
            return match state {
                S::AwaitingPeerConfirmation => (S::Verifying, Vec::new()),
                other => (other, Vec::new()),
            };
        }

        // At or past the midpoint. A known inviter may jump straight here.
        match state {
            S::IntroducingSelf { peer: Some(known) } => {
                (S::IntroducingSelf { peer: Some(known) }, Vec::new())
            }
            _ => {
                let actions = peer
                    .map(|peer| vec![HandshakeAction::AnnouncePeer { peer }])
                    .unwrap_or_default();
                (S::IntroducingSelf { peer }, actions)
            }
        }
    }
}
