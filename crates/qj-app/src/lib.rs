//! QR secure-join application layer
//!
//! Use cases and orchestration on top of `qj-core`: the progress bridge, the
//! secure-join engine, invitation handling and account operations.

pub mod progress;
pub mod usecases;

pub use progress::{BridgeError, OperationHandle, ProgressBridge, ProgressSubscription};
pub use usecases::*;
