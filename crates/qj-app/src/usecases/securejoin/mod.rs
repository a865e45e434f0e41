//! Joiner side of secure-join.

mod engine;
mod observer;

pub use engine::{HandshakeHandle, SecureJoinEngine};
pub use observer::HandshakeObserver;
