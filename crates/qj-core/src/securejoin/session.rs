use chrono::{DateTime, Utc};
use tracing::info;

use super::state_machine::{
    HandshakeAction, HandshakeEvent, HandshakeState, HandshakeStateMachine,
};
use crate::ids::SessionId;
use crate::progress::Permille;

/// One secure-join attempt, owned by whoever started it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeSession {
    pub id: SessionId,
    /// Invitation text the handshake was started with.
    pub code: String,
    pub state: HandshakeState,
    /// Last progress value seen from the core.
    pub progress_stage: Option<Permille>,
    pub started_at: DateTime<Utc>,
}

impl HandshakeSession {
    pub fn new(id: SessionId, code: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            code: code.into(),
            state: HandshakeState::NotStarted,
            progress_stage: None,
            started_at,
        }
    }

    /// Feeds `event` through the state machine.
    ///
    /// Returns the actions to execute and whether the state changed.
    pub fn apply(&mut self, event: HandshakeEvent) -> (bool, Vec<HandshakeAction>) {
        if let HandshakeEvent::Progress { permille, .. } = &event {
            if !self.state.is_terminal() {
                self.progress_stage = Some(*permille);
            }
        }

        let from = self.state.clone();
        let event_name = format!("{:?}", event);
        let (next, actions) = HandshakeStateMachine::transition(from.clone(), event);
        let changed = next != from;
        if changed {
            info!(
                session_id = %self.id,
                from = ?from,
                to = ?next,
                event = %event_name,
                "secure-join state transition"
            );
        }
        self.state = next;
        (changed, actions)
    }
}
