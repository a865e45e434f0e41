//! Command line surface of qrjoin.

mod commands;
pub mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use qj_core::ports::ImexMode;

pub use commands::{
    run_check, run_configure, run_imex, run_invite, run_join, run_withdraw, CommandStatus,
};

#[derive(Parser, Debug)]
#[command(name = "qrjoin")]
#[command(about = "Scan, verify and join via secure-join QR codes", long_about = None)]
pub struct Cli {
    /// Config file (defaults to <config_dir>/qrjoin/config.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a scanned code and describe it
    Check {
        /// Raw text of the scanned code
        text: String,
        /// Print the classification as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the secure-join handshake for a scanned invitation
    Join {
        /// Raw text of the scanned code
        code: String,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Print our own invitation code
    Invite {
        /// Invite into this group instead of a 1:1 chat
        #[arg(long, requires = "group_name")]
        group_id: Option<String>,
        #[arg(long, requires = "group_id")]
        group_name: Option<String>,
    },
    /// Withdraw the current invitation code
    Withdraw {
        #[arg(long)]
        group_id: Option<String>,
    },
    /// Configure the account from the stored credentials
    Configure,
    /// Import or export backups and keys
    Imex {
        #[arg(value_enum)]
        mode: ImexArg,
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImexArg {
    ExportBackup,
    ImportBackup,
    ExportKeys,
    ImportKeys,
}

impl From<ImexArg> for ImexMode {
    fn from(arg: ImexArg) -> Self {
        match arg {
            ImexArg::ExportBackup => ImexMode::ExportBackup,
            ImexArg::ImportBackup => ImexMode::ImportBackup,
            ImexArg::ExportKeys => ImexMode::ExportKeys,
            ImexArg::ImportKeys => ImexMode::ImportKeys,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_join_with_global_config() {
        let cli = Cli::try_parse_from([
            "qrjoin",
            "join",
            "OPENPGP4FPR:ABC",
            "--yes",
            "--config",
            "/tmp/qrjoin.toml",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/qrjoin.toml")));
        match cli.command {
            Commands::Join { code, yes } => {
                assert_eq!(code, "OPENPGP4FPR:ABC");
                assert!(yes);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn group_invite_needs_both_id_and_name() {
        assert!(Cli::try_parse_from(["qrjoin", "invite", "--group-id", "g1"]).is_err());
        assert!(Cli::try_parse_from([
            "qrjoin",
            "invite",
            "--group-id",
            "g1",
            "--group-name",
            "Team"
        ])
        .is_ok());
    }

    #[test]
    fn imex_mode_uses_kebab_case() {
        let cli = Cli::try_parse_from(["qrjoin", "imex", "export-backup", "/tmp/out"]).unwrap();
        match cli.command {
            Commands::Imex { mode, .. } => {
                assert_eq!(ImexMode::from(mode), ImexMode::ExportBackup)
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
