use std::path::PathBuf;
use std::sync::Arc;

use qj_core::ports::{AccountCorePort, ImexMode};
use qj_core::progress::OperationKind;
use tracing::{info, info_span};

use crate::progress::{BridgeError, OperationHandle, ProgressBridge};

/// Use case running a backup or key import/export in the background.
pub struct ImportExport {
    bridge: ProgressBridge,
    core: Arc<dyn AccountCorePort>,
}

impl ImportExport {
    pub fn new(bridge: ProgressBridge, core: Arc<dyn AccountCorePort>) -> Self {
        Self { bridge, core }
    }

    pub fn execute(&self, mode: ImexMode, path: PathBuf) -> Result<OperationHandle, BridgeError> {
        let _guard = info_span!("usecase.import_export.execute", ?mode, path = %path.display())
            .entered();
        let core = self.core.clone();
        let handle = self.bridge.run(OperationKind::ImportExport, move || {
            core.imex(mode, &path).map(|()| None)
        })?;
        info!(operation_id = %handle.id(), "import/export started");
        Ok(handle)
    }

    pub fn cancel(&self, handle: &OperationHandle) -> bool {
        self.bridge.cancel(handle)
    }
}
