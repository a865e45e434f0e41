//! Invite token stores.

mod file;

pub use file::JsonFileTokenStore;

use std::collections::HashMap;

use async_trait::async_trait;
use qj_core::ports::{InviteScope, InviteTokenStorePort, InviteTokens, TokenStoreError};
use tokio::sync::RwLock;

/// Tokens kept for the lifetime of the process.
#[derive(Default)]
pub struct InMemoryTokenStore {
    tokens: RwLock<HashMap<InviteScope, InviteTokens>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InviteTokenStorePort for InMemoryTokenStore {
    async fn get(&self, scope: &InviteScope) -> Result<Option<InviteTokens>, TokenStoreError> {
        Ok(self.tokens.read().await.get(scope).cloned())
    }

    async fn save(&self, scope: &InviteScope, tokens: InviteTokens) -> Result<(), TokenStoreError> {
        self.tokens.write().await.insert(scope.clone(), tokens);
        Ok(())
    }

    async fn remove(&self, scope: &InviteScope) -> Result<bool, TokenStoreError> {
        Ok(self.tokens.write().await.remove(scope).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scopes_are_independent() {
        let store = InMemoryTokenStore::new();
        let group = InviteScope::Group("g1".to_string());
        store
            .save(
                &InviteScope::Contact,
                InviteTokens {
                    invitenumber: "i".to_string(),
                    auth: "a".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(store.get(&group).await.unwrap().is_none());
        assert!(store.remove(&InviteScope::Contact).await.unwrap());
        assert!(!store.remove(&InviteScope::Contact).await.unwrap());
    }
}
