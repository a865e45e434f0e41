use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::qr::Fingerprint;

use super::errors::TokenStoreError;

/// What an invite token pair grants access to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InviteScope {
    Contact,
    Group(String),
}

impl std::fmt::Display for InviteScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contact => f.write_str("contact"),
            Self::Group(id) => write!(f, "group:{id}"),
        }
    }
}

/// `invitenumber` + `auth` pair handed out in one code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteTokens {
    pub invitenumber: String,
    pub auth: String,
}

#[async_trait]
pub trait InviteTokenStorePort: Send + Sync {
    async fn get(&self, scope: &InviteScope) -> Result<Option<InviteTokens>, TokenStoreError>;

    async fn save(&self, scope: &InviteScope, tokens: InviteTokens)
        -> Result<(), TokenStoreError>;

    /// Returns true if tokens existed.
    async fn remove(&self, scope: &InviteScope) -> Result<bool, TokenStoreError>;
}

/// Local account identity used when rendering invitations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfIdentity {
    pub addr: String,
    pub display_name: Option<String>,
    pub fingerprint: Fingerprint,
}

#[async_trait]
pub trait SelfIdentityPort: Send + Sync {
    /// `None` while the account is not configured.
    async fn current(&self) -> Option<SelfIdentity>;
}
