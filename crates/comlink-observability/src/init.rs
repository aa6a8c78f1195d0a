// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console logging is always available. With the `file-logging` feature,
//! [`init_logging`] also writes per-crate and combined log files into a
//! timestamped run folder and prunes old runs.

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

/// `EnvFilter` built from the debug flags
pub fn build_env_filter(debug_flags: &CrateDebugFlags) -> Result<EnvFilter> {
    let directives = debug_flags.to_filter_string();
    EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter directives: {}", directives))
}

/// Install a console subscriber filtered by the debug flags
///
/// # Errors
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn init_console_logging(debug_flags: &CrateDebugFlags) -> Result<()> {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_filter(build_env_filter(debug_flags)?);

    Registry::default()
        .with(console_layer)
        .try_init()
        .context("Failed to install global tracing subscriber")?;
    Ok(())
}

#[cfg(feature = "file-logging")]
pub use file::{init_logging, init_logging_default, LoggingGuard};

#[cfg(feature = "file-logging")]
mod file {
    use super::*;
    use crate::retention::{cleanup_old_logs, run_folder_name};
    use chrono::Utc;
    use std::path::{Path, PathBuf};
    use tracing_appender::rolling;

    /// Keeps the background log writers alive; logs are flushed on drop
    pub struct LoggingGuard {
        _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
        log_dir: PathBuf,
    }

    impl LoggingGuard {
        /// Run folder this process logs into
        pub fn log_dir(&self) -> &Path {
            &self.log_dir
        }
    }

    /// Initialize console and file logging
    ///
    /// Creates a timestamped folder structure:
    /// ```text
    /// ./logs/
    ///   └── run_20250101_120000/
    ///       ├── comlink-driver.log
    ///       ├── comlink-io.log
    ///       └── comlink.log (combined)
    /// ```
    ///
    /// # Arguments
    /// * `debug_flags` - Per-crate debug flags for filtering
    /// * `log_dir` - Base directory for logs (default: `./logs`)
    /// * `retention_days` - Keep logs for N days (default: 30)
    /// * `retention_runs` - Keep N most recent runs (default: 10)
    pub fn init_logging(
        debug_flags: &CrateDebugFlags,
        log_dir: Option<PathBuf>,
        retention_days: Option<u64>,
        retention_runs: Option<usize>,
    ) -> Result<LoggingGuard> {
        let base_log_dir = log_dir.unwrap_or_else(|| PathBuf::from("./logs"));
        let run_folder = base_log_dir.join(run_folder_name(Utc::now()));
        std::fs::create_dir_all(&run_folder)
            .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

        cleanup_old_logs(&base_log_dir, retention_days, retention_runs)?;

        let mut layers = Vec::new();
        let mut file_guards = Vec::new();

        layers.push(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_filter(build_env_filter(debug_flags)?)
                .boxed(),
        );

        // One file per crate, each at debug for its own target only
        for crate_name in crate::KNOWN_CRATES {
            let appender = rolling::daily(&run_folder, format!("{}.log", crate_name));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            file_guards.push(guard);

            let target = crate_name.replace('-', "_");
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::try_new(format!("{}=debug", target))?)
                    .boxed(),
            );
        }

        let combined = rolling::daily(&run_folder, "comlink.log");
        let (combined_writer, combined_guard) = tracing_appender::non_blocking(combined);
        file_guards.push(combined_guard);
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(combined_writer)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_filter(build_env_filter(debug_flags)?)
                .boxed(),
        );

        Registry::default()
            .with(layers)
            .try_init()
            .context("Failed to install global tracing subscriber")?;

        Ok(LoggingGuard {
            _file_guards: file_guards,
            log_dir: run_folder,
        })
    }

    /// Initialize logging with default directory and retention
    pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
        init_logging(debug_flags, None, None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_from_flags_parses() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()])
            .with_base_level("warn");
        assert!(build_env_filter(&flags).is_ok());
    }

    #[test]
    fn test_bad_base_level_is_reported() {
        let flags = CrateDebugFlags::default().with_base_level("comlink_io=loud");
        let err = build_env_filter(&flags).unwrap_err();
        assert!(err.to_string().contains("Invalid log filter directives"));
    }

    #[test]
    fn test_second_init_fails_cleanly() {
        let flags = CrateDebugFlags::default();
        // Another test in this binary may have installed one already
        let _ = init_console_logging(&flags);
        assert!(init_console_logging(&flags).is_err());
    }
}
