// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # comlink-observability
//!
//! Logging setup shared by the comlink crates, with per-crate debug flag
//! support (`--debug-comlink-io`, `--debug-all`, `COMLINK_DEBUG`).
//!
//! ## Features
//! - `file-logging`: timestamped run folders with daily rotation and retention

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;
pub mod retention;

pub use cli::*;
pub use init::*;

/// Known comlink crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "comlink",
    "comlink-driver",
    "comlink-io",
    "comlink-config",
    "comlink-observability",
];
