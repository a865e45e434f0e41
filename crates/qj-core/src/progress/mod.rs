//! Progress model shared by every long-running core operation.

mod event;
mod inviter;
mod permille;

pub use event::{FailureCause, OperationKind, ProgressEvent, ProgressPayload};
pub use inviter::{InviterEvent, InviterStage};
pub use permille::Permille;

/// Shown when a failure arrives without any text from the core.
pub const UNKNOWN_ERROR: &str = "Unknown error";
