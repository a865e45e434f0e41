//! 扫码分类用例

use std::sync::Arc;

use qj_core::ports::PeerResolverPort;
use qj_core::qr::{classify, QrIntent};
use tracing::{info, info_span};

/// Use case for turning scanned or pasted text into a [`QrIntent`].
pub struct ClassifyQr {
    resolver: Arc<dyn PeerResolverPort>,
}

impl ClassifyQr {
    pub fn new(resolver: Arc<dyn PeerResolverPort>) -> Self {
        Self { resolver }
    }

    pub fn execute(&self, raw: &str) -> QrIntent {
        let span = info_span!("usecase.classify_qr.execute", len = raw.len());
        let _guard = span.enter();

        let intent = classify(raw, self.resolver.as_ref());
        info!(kind = ?intent.kind(), "scanned code classified");
        intent
    }
}
