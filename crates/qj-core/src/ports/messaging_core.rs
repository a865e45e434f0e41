//! Ports onto the external messaging core.
//!
//! Every call here blocks for as long as the core needs (network round trips,
//! key handling, backup I/O). Callers must run them off the UI thread; the
//! progress bridge does that.
//!
//! 核心库调用都是阻塞的，进度通过 [`CoreEventHandler`] 回调上报。

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ids::{ChatId, ContactId};

use super::errors::CoreError;

/// Raw notification emitted by the core while it works.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    ConfigureProgress { permille: u16 },
    ImexProgress { permille: u16 },
    /// Joiner side of a secure-join; `contact_id` is the inviter.
    JoinerProgress { contact_id: ContactId, permille: u16 },
    /// Inviter side of a secure-join; `contact_id` is the joiner.
    InviterProgress { contact_id: ContactId, permille: u16 },
    Info(String),
    Warning(String),
    Error(String),
    ErrorNetwork(String),
}

/// Receives [`CoreEvent`]s. Called from whatever thread the core runs on.
pub trait CoreEventHandler: Send + Sync {
    fn on_core_event(&self, event: CoreEvent);
}

/// Stops whatever blocking call is currently running, best-effort.
pub trait OngoingProcessPort: Send + Sync {
    fn stop_ongoing_process(&self);
}

pub trait SecureJoinCorePort: Send + Sync {
    /// Runs the joiner side of the handshake for `code`.
    ///
    /// Blocks until the handshake ends. Progress arrives as
    /// [`CoreEvent::JoinerProgress`].
    fn join_securejoin(&self, code: &str) -> Result<ChatId, CoreError>;
}

/// What an import/export run does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImexMode {
    ExportBackup,
    ImportBackup,
    ExportKeys,
    ImportKeys,
}

pub trait AccountCorePort: Send + Sync {
    /// Configures the account from the stored credentials.
    fn configure(&self) -> Result<(), CoreError>;

    /// Imports or exports backups and keys at `path`.
    fn imex(&self, mode: ImexMode, path: &Path) -> Result<(), CoreError>;
}
