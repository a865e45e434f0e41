use qj_core::ids::{ContactId, SessionId};
use qj_core::securejoin::HandshakeState;

/// Receives the progress of one handshake.
///
/// Callbacks run on a dedicated task, one at a time and in transition order.
/// They may call back into the engine (e.g. `cancel`).
///
/// 回调在独立任务中按顺序执行，可以在回调里调用 `cancel`。
pub trait HandshakeObserver: Send + Sync {
    fn on_state_changed(&self, session_id: &SessionId, state: &HandshakeState);

    /// The inviter verified us; `peer` is its contact id.
    fn on_peer_verified(&self, _session_id: &SessionId, _peer: ContactId) {}
}
