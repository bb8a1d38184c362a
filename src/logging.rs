//! Logging initialization for the two application frontends.
//!
//! The GUI installs a fan-out logger (`multi_log`): one branch is a
//! standard `env_logger` writing to stderr, the other a [`LogCollector`]
//! feeding the in-window log panel. Headless subcommands use a
//! `tracing-subscriber` fmt pipeline with environment-based filtering
//! instead.
//!
//! Both initializers are idempotent so tests and embedders can call them
//! freely; only the first call in a process installs anything.

use once_cell::sync::OnceCell;

use crate::error::{AppResult, ScopeError};
use crate::log_capture::{CapturedLog, LogCollector};

/// Install the GUI logger: stderr plus the in-window capture buffer.
///
/// `level` is the default filter, overridable via `RUST_LOG`.
pub fn init_gui(level: &str, buffer: &CapturedLog) -> AppResult<()> {
    static STARTED: OnceCell<()> = OnceCell::new();
    STARTED.get_or_try_init(|| -> AppResult<()> {
        let stderr =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
                .build();
        let collector = LogCollector::new(buffer.clone());
        multi_log::MultiLogger::init(
            vec![Box::new(stderr), Box::new(collector)],
            log::Level::Trace,
        )
        .map_err(|e| ScopeError::Configuration(format!("logger already installed: {e}")))?;
        Ok(())
    })?;
    Ok(())
}

/// Install the headless tracing pipeline.
///
/// `level` is the default directive, overridable via `RUST_LOG`.
pub fn init_headless(level: &str) {
    static STARTED: OnceCell<()> = OnceCell::new();
    STARTED.get_or_init(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
        // try_init: a subscriber installed by a test harness wins.
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gui_init_is_idempotent() {
        let buffer = CapturedLog::new();
        init_gui("info", &buffer).unwrap();
        // Second call must be a no-op, not an "already installed" error.
        init_gui("debug", &buffer).unwrap();
    }

    #[test]
    fn headless_init_is_idempotent() {
        init_headless("info");
        init_headless("trace");
    }
}
