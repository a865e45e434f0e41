//! Secure-join handshake domain model.

mod error;
mod session;
mod state_machine;

pub use error::{HandshakeError, HandshakeOutcome};
pub use session::HandshakeSession;
pub use state_machine::{
    HandshakeAction, HandshakeEvent, HandshakeState, HandshakeStateMachine, PEER_VERIFIED_STAGE,
};
