use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use qj_infra::JsonFileTokenStore;
use qrjoin_lib::bootstrap::{self, tracing::init_tracing_subscriber};
use qrjoin_lib::cli::Cli;
use tracing::error;

const TOKEN_FILE_NAME: &str = "invite_tokens.json";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Config comes first so the logging section can shape the subscriber.
    let config = match bootstrap::load_or_empty(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load config: {err:#}");
            return ExitCode::from(2);
        }
    };

    if let Err(err) = init_tracing_subscriber(&config.logging) {
        eprintln!("Failed to initialize tracing: {err}");
    }

    match run(cli, config).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            error!(error = %format!("{err:#}"), "command failed");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: qj_core::AppConfig) -> anyhow::Result<u8> {
    let token_path = bootstrap::data_dir()?.join(TOKEN_FILE_NAME);
    let token_store = Arc::new(JsonFileTokenStore::new(token_path));
    let deps = bootstrap::wire_dependencies(
        &config,
        tokio::runtime::Handle::current(),
        token_store,
    )
    .context("Failed to wire dependencies")?;

    let mut stdout = io::stdout();
    let status = qrjoin_lib::run_command(&deps, cli.command, prompt_yes_no, &mut stdout).await?;
    Ok(status.exit_code())
}

/// Asks `question` on the terminal; only "y"/"yes" confirms.
fn prompt_yes_no(question: &str) -> anyhow::Result<bool> {
    let mut stdout = io::stdout();
    write!(stdout, "{question} [y/N] ")?;
    stdout.flush()?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read the answer")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
