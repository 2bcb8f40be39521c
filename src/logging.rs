use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Where log lines go
pub enum LogTarget {
    /// One-shot commands log to stderr, keeping stdout for the answer
    Stderr,
    /// The TUI owns the terminal, so logs go to `<dir>/docchat.log`
    File(PathBuf),
}

const DEFAULT_DIRECTIVE: &str = "docchat=info";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global subscriber. `RUST_LOG` overrides the default level.
pub fn init(target: LogTarget) -> Result<()> {
    let result = match target {
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init(),
        LogTarget::File(dir) => {
            std::fs::create_dir_all(&dir).context("Failed to create log directory")?;
            let path = dir.join("docchat.log");
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
        }
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))
}
