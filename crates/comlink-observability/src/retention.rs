// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Log run folders and their retention
//!
//! Each run logs into `<base>/run_YYYYmmdd_HHMMSS/`. Old runs are removed by
//! age first, then by count.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::{Path, PathBuf};

const RUN_PREFIX: &str = "run_";
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

pub const DEFAULT_RETENTION_DAYS: u64 = 30;
pub const DEFAULT_RETENTION_RUNS: usize = 10;

/// Folder name for a run started at `started`
pub fn run_folder_name(started: DateTime<Utc>) -> String {
    format!("{}{}", RUN_PREFIX, started.format(RUN_TIMESTAMP_FORMAT))
}

/// Start time encoded in a run folder name
pub fn parse_run_folder_name(name: &str) -> Option<DateTime<Utc>> {
    let timestamp = name.strip_prefix(RUN_PREFIX)?;
    NaiveDateTime::parse_from_str(timestamp, RUN_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Runs to delete: older than `retention_days`, then the oldest beyond
/// `retention_runs`
pub fn expired_runs(
    mut runs: Vec<(PathBuf, DateTime<Utc>)>,
    now: DateTime<Utc>,
    retention_days: u64,
    retention_runs: usize,
) -> Vec<PathBuf> {
    let days = i64::try_from(retention_days).unwrap_or(i64::MAX);
    let cutoff = chrono::Duration::try_days(days)
        .and_then(|age| now.checked_sub_signed(age))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    runs.sort_by_key(|(_, started)| *started);
    let (too_old, recent): (Vec<_>, Vec<_>) =
        runs.into_iter().partition(|(_, started)| *started < cutoff);

    let excess = recent.len().saturating_sub(retention_runs);
    too_old
        .into_iter()
        .chain(recent.into_iter().take(excess))
        .map(|(path, _)| path)
        .collect()
}

/// Delete expired run folders under `base_log_dir`
///
/// Removal failures are reported on stderr; logging is not up yet.
pub fn cleanup_old_logs(
    base_log_dir: &Path,
    retention_days: Option<u64>,
    retention_runs: Option<usize>,
) -> Result<()> {
    if !base_log_dir.exists() {
        return Ok(());
    }

    let mut runs = Vec::new();
    let entries = std::fs::read_dir(base_log_dir)
        .with_context(|| format!("Failed to list log directory: {}", base_log_dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let started = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(parse_run_folder_name);
        if let Some(started) = started {
            runs.push((path, started));
        }
    }

    let expired = expired_runs(
        runs,
        Utc::now(),
        retention_days.unwrap_or(DEFAULT_RETENTION_DAYS),
        retention_runs.unwrap_or(DEFAULT_RETENTION_RUNS),
    );
    for path in expired {
        if let Err(e) = std::fs::remove_dir_all(&path) {
            eprintln!(
                "Warning: Failed to remove old log directory {}: {}",
                path.display(),
                e
            );
        }
    }
    Ok(())
}
