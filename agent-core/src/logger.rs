//! Tracing initialization: fmt layer with full format (level, target, span, fields) written
//! to the log file, and optionally tee'd to stdout.

use std::fs::OpenOptions;
use std::io;
use std::sync::Arc;

use tracing_subscriber::{
    fmt::format::FmtSpan, fmt::writer::MakeWriterExt, layer::SubscriberExt,
    util::SubscriberInitExt, EnvFilter, Registry,
};

/// Installs the global tracing subscriber.
///
/// The level comes from `RUST_LOG` (default `info`), so `.env` must be loaded first. When
/// `console` is false only the file receives output, which keeps interactive stdout clean.
pub fn init_tracing(log_file_path: &str, console: bool) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;
    let file = Arc::new(file);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let base = tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    let registry = Registry::default().with(env_filter);
    let result = if console {
        registry
            .with(base.with_writer(io::stdout.and(file)))
            .try_init()
    } else {
        registry.with(base.with_ansi(false).with_writer(file)).try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_to_log_file_and_rejects_second_init() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.log");
        let path = path.to_str().unwrap();

        init_tracing(path, false).unwrap();
        tracing::info!(probe = 1, "logger probe");
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.contains("logger probe"));

        assert!(init_tracing(path, true).is_err());
    }
}
