//! QR payload classification.
//!
//! [`grammar`] recognises the shape of a scanned code, [`classify`] resolves
//! the peers it references and produces a [`QrIntent`].

pub mod addr;
mod classifier;
mod error;
mod fingerprint;
pub mod grammar;
mod intent;
mod invite;

pub use classifier::classify;
pub use error::QrParseError;
pub use fingerprint::{Fingerprint, FINGERPRINT_LEN};
pub use intent::{QrIntent, QrKind};
pub use invite::{GroupInvite, SecureJoinInvite, OPENPGP4FPR_SCHEME};
