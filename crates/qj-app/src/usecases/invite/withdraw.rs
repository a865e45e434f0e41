use std::sync::Arc;

use qj_core::ports::{InviteScope, InviteTokenStorePort};
use tracing::{info, info_span, Instrument};

use super::InviteError;

/// Use case invalidating the code of one scope.
///
/// The next [`super::GenerateInvite`] call yields fresh tokens; codes already
/// handed out can no longer be honoured.
pub struct WithdrawInvite {
    tokens: Arc<dyn InviteTokenStorePort>,
}

impl WithdrawInvite {
    pub fn new(tokens: Arc<dyn InviteTokenStorePort>) -> Self {
        Self { tokens }
    }

    /// Returns whether a code existed for `scope`.
    pub async fn execute(&self, scope: InviteScope) -> Result<bool, InviteError> {
        let span = info_span!("usecase.withdraw_invite.execute", scope = %scope);
        async {
            let removed = self.tokens.remove(&scope).await?;
            info!(removed, "invite withdrawn");
            Ok(removed)
        }
        .instrument(span)
        .await
    }
}
