//! Tracing configuration for qrjoin
//!
//! ## Behavior / 行为
//!
//! - Console output goes to stderr so stdout stays reserved for command output
//! - Optional non-blocking file log when `[logging] file_logging = true`
//! - `RUST_LOG` overrides the default directives

use std::{fs, io, path::PathBuf, sync::OnceLock};

use qj_core::config::LoggingConfig;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, fmt::writer::BoxMakeWriter, prelude::*, registry};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const LOG_FILE_NAME: &str = "qrjoin.log";

fn is_development() -> bool {
    cfg!(debug_assertions)
}

/// Build the default filter directives for tracing
///
/// - **Development**: debug level
/// - **Production**: info level, core grammar noise kept at info
fn build_filter_directives(is_dev: bool) -> Vec<String> {
    vec![
        if is_dev { "debug" } else { "info" }.to_string(),
        if is_dev { "qj_app=debug" } else { "qj_app=info" }.to_string(),
        if is_dev {
            "qj_infra=debug"
        } else {
            "qj_infra=info"
        }
        .to_string(),
        "qj_core=info".to_string(),
    ]
}

/// Initialize the tracing subscriber
///
/// Call once in `main`, after the config is loaded and before any command runs.
/// 在 main 中调用一次。
///
/// ## Errors / 错误
///
/// - Subscriber is already registered
/// - The file log guard was already set
pub fn init_tracing_subscriber(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter_directives = build_filter_directives(is_development());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter_directives.join(",")));

    let console_writer: BoxMakeWriter = BoxMakeWriter::new(io::stderr);
    let file_writer = if logging.file_logging {
        match build_file_writer(logging) {
            Ok(writer) => Some(writer),
            Err(err) => {
                eprintln!("Failed to initialize file logging, falling back to stderr: {err}");
                None
            }
        }
    } else {
        None
    };

    // "2025-01-15 10:30:45.123 INFO src/file.rs:42 target: message"
    let console_layer = fmt::layer()
        .with_timer(fmt::time::ChronoUtc::new(
            "%Y-%m-%d %H:%M:%S%.3f".to_string(),
        ))
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_ansi(cfg!(not(test)))
        .with_writer(console_writer);

    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_timer(fmt::time::ChronoUtc::new(
                "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            ))
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer)
    });

    let subscriber = registry().with(env_filter).with(console_layer);

    if let Some(layer) = file_layer {
        subscriber.with(layer).try_init()?;
    } else {
        subscriber.try_init()?;
    }

    Ok(())
}

/// `[logging] log_dir`, or `<data_local_dir>/qrjoin/logs` when empty.
fn resolve_log_dir(logging: &LoggingConfig) -> anyhow::Result<PathBuf> {
    if !logging.log_dir.as_os_str().is_empty() {
        return Ok(logging.log_dir.clone());
    }
    Ok(super::config::data_dir()?.join("logs"))
}

fn build_file_writer(logging: &LoggingConfig) -> anyhow::Result<NonBlocking> {
    let logs_dir = resolve_log_dir(logging)?;
    fs::create_dir_all(&logs_dir)?;

    let file_appender = tracing_appender::rolling::never(&logs_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    LOG_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Tracing log guard already initialized"))?;

    Ok(non_blocking)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_directives() {
        let dev_directives = build_filter_directives(true);
        assert!(dev_directives.contains(&"debug".to_string()));
        assert!(dev_directives.contains(&"qj_app=debug".to_string()));
        assert!(dev_directives.contains(&"qj_infra=debug".to_string()));

        let prod_directives = build_filter_directives(false);
        assert!(prod_directives.contains(&"info".to_string()));
        assert!(prod_directives.contains(&"qj_app=info".to_string()));
        assert!(prod_directives.contains(&"qj_core=info".to_string()));
    }

    #[test]
    fn test_configured_log_dir_wins() {
        let logging = LoggingConfig {
            log_dir: PathBuf::from("/var/log/qrjoin"),
            file_logging: true,
        };
        assert_eq!(
            resolve_log_dir(&logging).unwrap(),
            PathBuf::from("/var/log/qrjoin")
        );
    }
}
