use std::sync::Weak;

use qj_core::progress::{OperationKind, ProgressEvent};
use tokio::sync::mpsc;

use super::bridge::BridgeShared;

/// Identifies one observer registration, used to unsubscribe.
///
/// 观察者 ID，用于取消订阅。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);

/// Live registration on the bridge for one operation kind.
///
/// Receives every event published after it was created, in order. Dropping
/// it unsubscribes.
pub struct ProgressSubscription {
    pub(crate) id: ObserverId,
    pub(crate) kind: OperationKind,
    pub(crate) rx: mpsc::UnboundedReceiver<ProgressEvent>,
    pub(crate) bridge: Weak<BridgeShared>,
}

impl ProgressSubscription {
    pub fn id(&self) -> ObserverId {
        self.id
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Next event, or `None` once unsubscribed.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ProgressEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for ProgressSubscription {
    fn drop(&mut self) {
        if let Some(bridge) = self.bridge.upgrade() {
            bridge.remove_observer(self.id);
        }
    }
}
