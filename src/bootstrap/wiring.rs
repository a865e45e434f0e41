//! # Dependency Injection / 依赖注入模块
//!
//! The only place that knows qj-app and qj-infra at the same time.
//! Assembly only, no decisions: config values are passed through as-is.
//! 仅用于组装，不做决策。

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use qj_app::{
    ClassifyQr, ConfigureAccount, CoreEventRouter, GenerateInvite, ImportExport, ProgressBridge,
    SecureJoinEngine, WithdrawInvite,
};
use qj_core::config::AppConfig;
use qj_core::ports::{InviteTokenStorePort, OngoingProcessPort};
use qj_infra::{ConfigSelfIdentity, InMemoryContactStore, ScriptedCore, Transcript};
use tokio::runtime::Handle;
use tracing::info;

/// Everything the CLI commands need, fully wired.
pub struct AppDeps {
    pub contacts: Arc<InMemoryContactStore>,
    pub bridge: ProgressBridge,
    pub engine: SecureJoinEngine,
    pub classify_qr: ClassifyQr,
    pub generate_invite: GenerateInvite,
    pub withdraw_invite: WithdrawInvite,
    pub configure_account: ConfigureAccount,
    pub import_export: ImportExport,
}

/// Builds the dependency graph.
///
/// Order matters: the core exists before the bridge (the bridge stops it on
/// cancel) and the router is attached to the core only once the bridge exists.
/// 顺序：core → bridge → router → engine。
pub fn wire_dependencies(
    config: &AppConfig,
    runtime: Handle,
    token_store: Arc<dyn InviteTokenStorePort>,
) -> anyhow::Result<AppDeps> {
    let contacts = Arc::new(
        InMemoryContactStore::from_config(&config.contacts)
            .context("Failed to load [[contacts]]")?,
    );
    let transcript =
        Transcript::from_config(&config.transcript).context("Failed to load [transcript]")?;
    let core = Arc::new(ScriptedCore::new(transcript));

    let stopper: Arc<dyn OngoingProcessPort> = core.clone();
    let bridge = ProgressBridge::new(runtime, stopper);
    core.set_event_handler(Arc::new(CoreEventRouter::new(bridge.clone())));

    let watchdog = config
        .secure_join
        .watchdog_timeout_secs
        .map(Duration::from_secs);
    let engine = SecureJoinEngine::new(bridge.clone(), core.clone()).with_watchdog(watchdog);

    let identity = Arc::new(ConfigSelfIdentity::new(&config.self_identity));

    info!(
        contacts = contacts.len(),
        watchdog_secs = ?config.secure_join.watchdog_timeout_secs,
        "dependencies wired"
    );

    Ok(AppDeps {
        classify_qr: ClassifyQr::new(contacts.clone()),
        generate_invite: GenerateInvite::new(identity, token_store.clone()),
        withdraw_invite: WithdrawInvite::new(token_store),
        configure_account: ConfigureAccount::new(bridge.clone(), core.clone()),
        import_export: ImportExport::new(bridge.clone(), core),
        contacts,
        bridge,
        engine,
    })
}
