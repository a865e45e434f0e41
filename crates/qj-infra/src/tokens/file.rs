//! Token store persisted as one JSON document.
//!
//! Lets codes survive restarts so a printed code stays valid until it is
//! withdrawn.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use qj_core::ports::{InviteScope, InviteTokenStorePort, InviteTokens, TokenStoreError};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenFile {
    /// Keyed by the scope's display form (`contact`, `group:<id>`).
    #[serde(default)]
    scopes: BTreeMap<String, InviteTokens>,
}

pub struct JsonFileTokenStore {
    path: PathBuf,
    // serialises read-modify-write cycles
    lock: Mutex<()>,
}

impl JsonFileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<TokenFile, TokenStoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                TokenStoreError::Storage(format!("corrupt token file {}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TokenFile::default()),
            Err(e) => Err(TokenStoreError::Storage(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn store(&self, file: &TokenFile) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TokenStoreError::Storage(e.to_string()))?;
        }
        let bytes =
            serde_json::to_vec_pretty(file).map_err(|e| TokenStoreError::Storage(e.to_string()))?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| TokenStoreError::Storage(format!("failed to write {}: {e}", self.path.display())))?;
        debug!(path = %self.path.display(), scopes = file.scopes.len(), "token file written");
        Ok(())
    }
}

#[async_trait]
impl InviteTokenStorePort for JsonFileTokenStore {
    async fn get(&self, scope: &InviteScope) -> Result<Option<InviteTokens>, TokenStoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.scopes.get(&scope.to_string()).cloned())
    }

    async fn save(&self, scope: &InviteScope, tokens: InviteTokens) -> Result<(), TokenStoreError> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        file.scopes.insert(scope.to_string(), tokens);
        self.store(&file).await
    }

    async fn remove(&self, scope: &InviteScope) -> Result<bool, TokenStoreError> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        let removed = file.scopes.remove(&scope.to_string()).is_some();
        if removed {
            self.store(&file).await?;
        }
        Ok(removed)
    }
}
