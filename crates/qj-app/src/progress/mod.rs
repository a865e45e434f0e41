//! Async operation / progress bridge.

mod bridge;
mod subscription;

pub use bridge::{BridgeError, OperationHandle, OperationResult, ProgressBridge};
pub use subscription::{ObserverId, ProgressSubscription};
