// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-comlink-io`, `--debug-comlink-driver`, etc.
//! to raise one crate to `debug` while the rest stay at the base level.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Environment variable holding comma-separated crate names, or `all`
pub const DEBUG_ENV: &str = "COMLINK_DEBUG";

/// Per-crate debug flags
///
/// # Example
/// ```rust
/// use comlink_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-comlink-io".to_string()]);
/// assert!(flags.is_enabled("comlink-io"));
/// assert_eq!(flags.to_filter_string(), "comlink_io=debug,info");
/// ```
#[derive(Debug, Clone)]
pub struct CrateDebugFlags {
    pub enabled_crates: BTreeSet<String>,
    /// Level for everything not raised to debug
    pub base_level: String,
}

impl Default for CrateDebugFlags {
    fn default() -> Self {
        Self {
            enabled_crates: BTreeSet::new(),
            base_level: "info".to_string(),
        }
    }
}

impl CrateDebugFlags {
    /// Parse debug flags from command-line arguments
    ///
    /// Looks for arguments matching `--debug-{crate-name}`; `--debug-all`
    /// enables every crate in [`KNOWN_CRATES`].
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = Self::default();
        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enabled_crates.insert(crate_name.to_string());
            }
        }
        flags
    }

    /// Replace the base level (e.g. from `logging.level` in the config file)
    pub fn with_base_level(mut self, level: &str) -> Self {
        self.base_level = level.to_lowercase();
        self
    }

    /// Merge a `COMLINK_DEBUG`-style value: `all` or comma-separated crate names
    pub fn apply_env_value(&mut self, value: &str) {
        if value.trim() == "all" {
            self.enable_all();
            return;
        }
        for crate_name in value.split(',') {
            let crate_name = crate_name.trim();
            if !crate_name.is_empty() {
                self.enabled_crates.insert(crate_name.to_string());
            }
        }
    }

    fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enabled_crates.insert(crate_name.to_string());
        }
    }

    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// `DEBUG` for enabled crates, `INFO` otherwise
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Filter directives for `EnvFilter`
    ///
    /// Tracing targets are module paths, so crate names are written with
    /// underscores: `comlink_io=debug,comlink_driver=debug,info`.
    pub fn to_filter_string(&self) -> String {
        let mut filters: Vec<String> = self
            .enabled_crates
            .iter()
            .map(|crate_name| format!("{}=debug", crate_name.replace('-', "_")))
            .collect();
        filters.push(self.base_level.clone());
        filters.join(",")
    }
}

/// Debug flags from the process arguments and `COMLINK_DEBUG`
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(value) = env::var(DEBUG_ENV) {
        flags.apply_env_value(&value);
    }
    flags
}

/// Help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  {env}={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  {env}=all                               Enable debug for all crates

Examples:
  --debug-comlink-io
  --debug-comlink-io --debug-comlink-driver
  {env}=comlink-io,comlink-driver
"#,
        KNOWN_CRATES.join(", "),
        env = DEBUG_ENV
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-comlink-io".to_string()]);
        assert!(flags.is_enabled("comlink-io"));
        assert!(!flags.is_enabled("comlink-driver"));
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(vec![
            "comlink".to_string(),
            "--debug-all".to_string(),
        ]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_filter_string_uses_module_paths() {
        let flags = CrateDebugFlags::from_args(vec![
            "--debug-comlink-io".to_string(),
            "--debug-comlink-driver".to_string(),
        ])
        .with_base_level("WARN");
        assert_eq!(
            flags.to_filter_string(),
            "comlink_driver=debug,comlink_io=debug,warn"
        );
    }

    #[test]
    fn test_env_value() {
        let mut flags = CrateDebugFlags::default();
        flags.apply_env_value(" comlink-config , ,comlink-io");
        assert!(flags.is_enabled("comlink-config"));
        assert!(flags.is_enabled("comlink-io"));
        assert_eq!(flags.enabled_crates.len(), 2);

        let mut flags = CrateDebugFlags::default();
        flags.apply_env_value("all");
        assert_eq!(flags.enabled_crates.len(), KNOWN_CRATES.len());
    }

    #[test]
    fn test_log_level() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-comlink-io".to_string()]);
        assert_eq!(flags.log_level("comlink-io"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("comlink-driver"), tracing::Level::INFO);
        assert!(flags.any_enabled());
    }

    #[test]
    fn test_help_mentions_env_var() {
        assert!(debug_flags_help().contains("COMLINK_DEBUG=all"));
    }
}
