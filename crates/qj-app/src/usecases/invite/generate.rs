use std::sync::Arc;

use qj_core::ports::{InviteScope, InviteTokenStorePort, InviteTokens, SelfIdentityPort};
use qj_core::qr::{GroupInvite, SecureJoinInvite};
use rand::distr::Alphanumeric;
use rand::Rng;
use tracing::{debug, info, info_span, Instrument};

use super::InviteError;

const TOKEN_LEN: usize = 24;

/// Group a code should invite into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRef {
    pub id: String,
    pub name: String,
}

/// Use case producing the `OPENPGP4FPR:` text shown as our QR code.
///
/// Token pairs are created once per scope and reused, so the same code is
/// shown until it is withdrawn.
pub struct GenerateInvite {
    identity: Arc<dyn SelfIdentityPort>,
    tokens: Arc<dyn InviteTokenStorePort>,
}

impl GenerateInvite {
    pub fn new(identity: Arc<dyn SelfIdentityPort>, tokens: Arc<dyn InviteTokenStorePort>) -> Self {
        Self { identity, tokens }
    }

    pub async fn execute(&self, group: Option<GroupRef>) -> Result<String, InviteError> {
        let scope = match &group {
            Some(group) => InviteScope::Group(group.id.clone()),
            None => InviteScope::Contact,
        };
        let span = info_span!("usecase.generate_invite.execute", scope = %scope);

        async {
            let identity = self
                .identity
                .current()
                .await
                .ok_or(InviteError::NotConfigured)?;

            let tokens = match self.tokens.get(&scope).await? {
                Some(tokens) => {
                    debug!("reusing invite tokens");
                    tokens
                }
                None => {
                    let tokens = InviteTokens {
                        invitenumber: random_token(),
                        auth: random_token(),
                    };
                    self.tokens.save(&scope, tokens.clone()).await?;
                    info!("created invite tokens");
                    tokens
                }
            };

            let invite = SecureJoinInvite {
                fingerprint: identity.fingerprint,
                addr: identity.addr,
                name: identity.display_name,
                invitenumber: Some(tokens.invitenumber),
                auth: Some(tokens.auth),
                group: group.map(|g| GroupInvite {
                    id: g.id,
                    name: g.name,
                }),
            };
            Ok(invite.to_qr_text())
        }
        .instrument(span)
        .await
    }
}

fn random_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_tokens_are_url_safe() {
        let token = random_token();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, random_token());
    }
}
