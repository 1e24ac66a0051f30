//! Tracing subscriber setup shared by the binaries

use anyhow::Result;
use std::path::Path;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_DIRECTIVES: &str = "spontaria=info,tower_http=info";

fn env_filter(default_directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives))
}

/// Human-readable logs on stderr, filtered by `RUST_LOG` when set.
pub fn init_stderr(default_directives: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter(default_directives))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .try_init()?;

    debug!("Logging initialized on stderr");
    Ok(())
}

/// JSON logs in a daily rolling file, for processes whose stdout carries a protocol.
pub fn init_file(log_dir: &Path, file_prefix: &str) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, file_prefix);

    tracing_subscriber::registry()
        .with(
            env_filter("debug")
                .add_directive("spontaria=debug".parse()?)
                .add_directive("reqwest=info".parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .json(),
        )
        .try_init()?;

    info!(dir = %log_dir.display(), prefix = file_prefix, "Logging initialized");
    Ok(())
}
