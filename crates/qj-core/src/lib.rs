//! # qj-core
//!
//! Core domain models for QR based secure-join.
//!
//! Pure logic only: the QR grammar and classifier, the handshake state
//! machine, the progress model and the ports implemented by adapters.

pub mod config;
pub mod ids;
pub mod ports;
pub mod progress;
pub mod qr;
pub mod securejoin;

pub use config::AppConfig;
pub use ids::{ChatId, ContactId, OperationId, SessionId};
pub use progress::{OperationKind, Permille, ProgressEvent, ProgressPayload};
pub use qr::{classify, QrIntent, QrKind};
pub use securejoin::{HandshakeError, HandshakeState};
