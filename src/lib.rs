//! qrjoin: command line driver for QR based secure-join.
//!
//! `bootstrap` loads the config, installs tracing and wires the crates;
//! `cli` holds the clap surface and the command handlers.

pub mod bootstrap;
pub mod cli;

use std::io::Write;

use qj_app::GroupRef;

use crate::bootstrap::AppDeps;
use crate::cli::{CommandStatus, Commands};

/// Dispatches one parsed command against wired dependencies.
pub async fn run_command<W, C>(
    deps: &AppDeps,
    command: Commands,
    confirm: C,
    out: &mut W,
) -> anyhow::Result<CommandStatus>
where
    W: Write,
    C: FnOnce(&str) -> anyhow::Result<bool>,
{
    match command {
        Commands::Check { text, json } => cli::run_check(deps, &text, json, out),
        Commands::Join { code, yes } => {
            if yes {
                cli::run_join(deps, &code, |_| Ok(true), out).await
            } else {
                cli::run_join(deps, &code, confirm, out).await
            }
        }
        Commands::Invite {
            group_id,
            group_name,
        } => {
            let group = group_id
                .zip(group_name)
                .map(|(id, name)| GroupRef { id, name });
            cli::run_invite(deps, group, out).await
        }
        Commands::Withdraw { group_id } => cli::run_withdraw(deps, group_id, out).await,
        Commands::Configure => cli::run_configure(deps, out).await,
        Commands::Imex { mode, path } => cli::run_imex(deps, mode.into(), path, out).await,
    }
}
