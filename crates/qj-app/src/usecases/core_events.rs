//! Routes raw core notifications to typed consumers.
//!
//! 把核心库的原始事件分发到进度桥和邀请方事件通道。

use qj_core::ports::{CoreEvent, CoreEventHandler};
use qj_core::progress::{FailureCause, InviterEvent, InviterStage, OperationKind, Permille};
use qj_core::securejoin::PEER_VERIFIED_STAGE;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::progress::ProgressBridge;

const INVITER_CHANNEL_CAPACITY: usize = 64;

/// [`CoreEventHandler`] that feeds the progress bridge.
///
/// - configure, import/export and joiner progress go to the active bridge
///   operation of the matching kind
/// - error text is recorded as the failure message of running operations
/// - inviter progress is published as [`InviterEvent`]s
pub struct CoreEventRouter {
    bridge: ProgressBridge,
    inviter_tx: broadcast::Sender<InviterEvent>,
}

impl CoreEventRouter {
    pub fn new(bridge: ProgressBridge) -> Self {
        let (inviter_tx, _) = broadcast::channel(INVITER_CHANNEL_CAPACITY);
        Self { bridge, inviter_tx }
    }

    /// Inviter-side milestones, for whoever shows "X scanned your code".
    pub fn subscribe_inviter(&self) -> broadcast::Receiver<InviterEvent> {
        self.inviter_tx.subscribe()
    }
}

impl CoreEventHandler for CoreEventRouter {
    fn on_core_event(&self, event: CoreEvent) {
        match event {
            CoreEvent::ConfigureProgress { permille } => {
                self.bridge.report(OperationKind::Configure, permille, None);
            }
            CoreEvent::ImexProgress { permille } => {
                self.bridge.report(OperationKind::ImportExport, permille, None);
            }
            CoreEvent::JoinerProgress {
                contact_id,
                permille,
            } => {
                let peer = (permille >= PEER_VERIFIED_STAGE).then_some(contact_id);
                self.bridge.report(OperationKind::SecureJoin, permille, peer);
            }
            CoreEvent::InviterProgress {
                contact_id,
                permille,
            } => {
                let Some(stage) = Permille::new(permille).and_then(InviterStage::from_permille)
                else {
                    debug!(permille, "ignoring unknown inviter progress");
                    return;
                };
                info!(contact_id = %contact_id, ?stage, "inviter progress");
                // no receivers is fine
                let _ = self.inviter_tx.send(InviterEvent { contact_id, stage });
            }
            CoreEvent::Error(message) => {
                warn!(%message, "core error");
                self.bridge.record_error(&message, FailureCause::Peer);
            }
            CoreEvent::ErrorNetwork(message) => {
                warn!(%message, "core network error");
                self.bridge.record_error(&message, FailureCause::Transport);
            }
            CoreEvent::Warning(message) => warn!(%message, "core warning"),
            CoreEvent::Info(message) => debug!(%message, "core info"),
        }
    }
}
