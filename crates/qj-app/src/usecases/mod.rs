//! Business logic use cases

pub mod classify_qr;
pub mod core_events;
pub mod invite;
pub mod operations;
pub mod securejoin;

pub use classify_qr::ClassifyQr;
pub use core_events::CoreEventRouter;
pub use invite::{GenerateInvite, GroupRef, InviteError, WithdrawInvite};
pub use operations::{ConfigureAccount, ImportExport};
pub use securejoin::{HandshakeHandle, HandshakeObserver, SecureJoinEngine};
