use std::sync::Arc;

use qj_core::ports::AccountCorePort;
use qj_core::progress::OperationKind;
use tracing::{info, info_span};

use crate::progress::{BridgeError, OperationHandle, ProgressBridge};

/// Use case configuring the account in the background.
///
/// Progress and the outcome are published on the bridge under
/// [`OperationKind::Configure`].
pub struct ConfigureAccount {
    bridge: ProgressBridge,
    core: Arc<dyn AccountCorePort>,
}

impl ConfigureAccount {
    pub fn new(bridge: ProgressBridge, core: Arc<dyn AccountCorePort>) -> Self {
        Self { bridge, core }
    }

    pub fn execute(&self) -> Result<OperationHandle, BridgeError> {
        let _guard = info_span!("usecase.configure_account.execute").entered();
        let core = self.core.clone();
        let handle = self
            .bridge
            .run(OperationKind::Configure, move || core.configure().map(|()| None))?;
        info!(operation_id = %handle.id(), "configure started");
        Ok(handle)
    }

    pub fn cancel(&self, handle: &OperationHandle) -> bool {
        self.bridge.cancel(handle)
    }
}
