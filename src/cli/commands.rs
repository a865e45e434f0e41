//! Command handlers. Each one writes its user-facing output to `out` and
//! reports how it ended; logging goes through `tracing`.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use qj_app::{
    GroupRef, HandshakeObserver, InviteError, OperationHandle, ProgressSubscription,
};
use qj_core::ids::{ContactId, SessionId};
use qj_core::ports::{ImexMode, InviteScope};
use qj_core::progress::{OperationKind, ProgressPayload};
use qj_core::{HandshakeError, HandshakeState};
use tracing::{info, warn};

use super::render::{describe_intent, name_n_addr, non_empty_error};
use crate::bootstrap::AppDeps;

/// How a command ended, mapped to the process exit code by `main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failed,
    Cancelled,
}

impl CommandStatus {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failed => 1,
            Self::Cancelled => 130,
        }
    }
}

/// `qrjoin check`
pub fn run_check<W: Write>(
    deps: &AppDeps,
    text: &str,
    json: bool,
    out: &mut W,
) -> anyhow::Result<CommandStatus> {
    let intent = deps.classify_qr.execute(text);
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&intent)?)?;
    } else {
        writeln!(out, "{}", describe_intent(&intent, &deps.contacts))?;
    }
    Ok(match intent {
        qj_core::QrIntent::Error { .. } => CommandStatus::Failed,
        _ => CommandStatus::Success,
    })
}

/// Logs handshake transitions; the join command prints from the progress
/// stream itself.
struct LoggingObserver;

impl HandshakeObserver for LoggingObserver {
    fn on_state_changed(&self, session_id: &SessionId, state: &HandshakeState) {
        info!(session_id = %session_id, state = state.name(), "handshake state changed");
    }

    fn on_peer_verified(&self, session_id: &SessionId, peer: ContactId) {
        info!(session_id = %session_id, peer = %peer, "peer verified");
    }
}

/// `qrjoin join`
///
/// Only verify codes start a handshake; `confirm` gets the question shown to
/// the user and decides whether to go on.
pub async fn run_join<W, C>(
    deps: &AppDeps,
    code: &str,
    confirm: C,
    out: &mut W,
) -> anyhow::Result<CommandStatus>
where
    W: Write,
    C: FnOnce(&str) -> anyhow::Result<bool>,
{
    let intent = deps.classify_qr.execute(code);
    let question = describe_intent(&intent, &deps.contacts);
    if !intent.is_verify() {
        writeln!(out, "{}", question)?;
        writeln!(out, "This code cannot be used to join.")?;
        return Ok(CommandStatus::Failed);
    }
    if !confirm(&question)? {
        writeln!(out, "Cancelled.")?;
        return Ok(CommandStatus::Cancelled);
    }

    let mut progress = deps.bridge.subscribe(OperationKind::SecureJoin);
    let handle = match deps.engine.begin_handshake(code, Arc::new(LoggingObserver)) {
        Ok(handle) => handle,
        Err(err) => {
            writeln!(out, "Error: {}", err)?;
            return Ok(CommandStatus::Failed);
        }
    };
    writeln!(out, "One moment…")?;

    let outcome = loop {
        tokio::select! {
            outcome = handle.wait() => break outcome,
            event = progress.recv() => match event {
                Some(event) if &event.operation_id == handle.operation_id() => {
                    if let ProgressPayload::StageUpdate { permille, peer } = event.payload {
                        match peer {
                            Some(peer) => writeln!(
                                out,
                                "{} verified, introducing myself… {}%",
                                name_n_addr(&deps.contacts, peer),
                                permille.percent()
                            )?,
                            None => writeln!(out, "One moment… {}%", permille.percent())?,
                        }
                    }
                }
                Some(_) => {}
                None => break handle.wait().await,
            },
            _ = tokio::signal::ctrl_c() => {
                warn!("interrupted, cancelling secure-join");
                deps.engine.cancel(&handle);
            }
        }
    };

    Ok(match outcome {
        Ok(chat_id) => {
            writeln!(out, "Joined, chat #{}.", chat_id)?;
            CommandStatus::Success
        }
        Err(HandshakeError::Cancelled) => {
            writeln!(out, "Cancelled.")?;
            CommandStatus::Cancelled
        }
        Err(HandshakeError::PeerRejected(message) | HandshakeError::TransportError(message)) => {
            writeln!(out, "Error: {}", non_empty_error(&message))?;
            CommandStatus::Failed
        }
        Err(err @ HandshakeError::AlreadyInProgress) => {
            writeln!(out, "Error: {}", err)?;
            CommandStatus::Failed
        }
    })
}

/// `qrjoin invite`
pub async fn run_invite<W: Write>(
    deps: &AppDeps,
    group: Option<GroupRef>,
    out: &mut W,
) -> anyhow::Result<CommandStatus> {
    match deps.generate_invite.execute(group).await {
        Ok(code) => {
            writeln!(out, "{}", code)?;
            Ok(CommandStatus::Success)
        }
        Err(InviteError::NotConfigured) => {
            writeln!(out, "Error: {}", InviteError::NotConfigured)?;
            Ok(CommandStatus::Failed)
        }
        Err(err) => Err(err.into()),
    }
}

/// `qrjoin withdraw`
pub async fn run_withdraw<W: Write>(
    deps: &AppDeps,
    group_id: Option<String>,
    out: &mut W,
) -> anyhow::Result<CommandStatus> {
    let scope = group_id.map_or(InviteScope::Contact, InviteScope::Group);
    if deps.withdraw_invite.execute(scope).await? {
        writeln!(out, "Invite code withdrawn.")?;
    } else {
        writeln!(out, "No invite code to withdraw.")?;
    }
    Ok(CommandStatus::Success)
}

/// `qrjoin configure`
pub async fn run_configure<W: Write>(deps: &AppDeps, out: &mut W) -> anyhow::Result<CommandStatus> {
    let progress = deps.bridge.subscribe(OperationKind::Configure);
    let handle = match deps.configure_account.execute() {
        Ok(handle) => handle,
        Err(err) => {
            writeln!(out, "Error: {}", err)?;
            return Ok(CommandStatus::Failed);
        }
    };
    let status = follow_operation(progress, &handle, |h| deps.configure_account.cancel(h), out).await?;
    if status == CommandStatus::Success {
        writeln!(out, "Account configured.")?;
    }
    Ok(status)
}

/// `qrjoin imex`
pub async fn run_imex<W: Write>(
    deps: &AppDeps,
    mode: ImexMode,
    path: PathBuf,
    out: &mut W,
) -> anyhow::Result<CommandStatus> {
    let progress = deps.bridge.subscribe(OperationKind::ImportExport);
    let handle = match deps.import_export.execute(mode, path) {
        Ok(handle) => handle,
        Err(err) => {
            writeln!(out, "Error: {}", err)?;
            return Ok(CommandStatus::Failed);
        }
    };
    let status = follow_operation(progress, &handle, |h| deps.import_export.cancel(h), out).await?;
    if status == CommandStatus::Success {
        writeln!(out, "Done.")?;
    }
    Ok(status)
}

/// Prints the progress of one bridge operation until it ends.
async fn follow_operation<W, F>(
    mut progress: ProgressSubscription,
    handle: &OperationHandle,
    cancel: F,
    out: &mut W,
) -> anyhow::Result<CommandStatus>
where
    W: Write,
    F: Fn(&OperationHandle) -> bool,
{
    loop {
        tokio::select! {
            event = progress.recv() => {
                let Some(event) = event else {
                    return Ok(CommandStatus::Failed);
                };
                if &event.operation_id != handle.id() {
                    continue;
                }
                match event.payload {
                    ProgressPayload::StageUpdate { permille, .. } => {
                        writeln!(out, "One moment… {}%", permille.percent())?;
                    }
                    ProgressPayload::Success { .. } => return Ok(CommandStatus::Success),
                    ProgressPayload::Failure { message, .. } => {
                        writeln!(out, "Error: {}", non_empty_error(&message))?;
                        return Ok(CommandStatus::Failed);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!(operation_id = %handle.id(), "interrupted, cancelling operation");
                if cancel(handle) {
                    writeln!(out, "Cancelled.")?;
                    return Ok(CommandStatus::Cancelled);
                }
            }
        }
    }
}
