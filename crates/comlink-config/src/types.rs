// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a table in `comlink.toml`:
//!
//! ```toml
//! [port]
//! name = "/dev/ttyUSB0"
//!
//! [port.settings]
//! baud = 9600
//! parity = "even"
//!
//! [timeouts]
//! mode = "finite"
//! read_timeout_ms = 100
//!
//! [buffers]
//! input_capacity = 1024
//!
//! [logging]
//! level = "debug"
//! ```

use comlink_driver::{SerialSettings, TimeoutMode, TimeoutPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ComlinkConfig {
    pub port: PortConfig,
    pub timeouts: TimeoutConfig,
    pub buffers: BufferConfig,
    pub logging: LoggingConfig,
}

impl ComlinkConfig {
    /// Timeout policy described by the `[timeouts]` table
    pub fn timeout_policy(&self) -> TimeoutPolicy {
        TimeoutPolicy {
            mode: self.timeouts.mode,
            read_timeout: Duration::from_millis(self.timeouts.read_timeout_ms),
            write_timeout: Duration::from_millis(self.timeouts.write_timeout_ms),
        }
    }
}

/// Port to open and its line settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PortConfig {
    pub name: String,
    pub settings: SerialSettings,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            name: "LOOPBACK".to_string(),
            settings: SerialSettings::default(),
        }
    }
}

/// Timeout policy in file form
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub mode: TimeoutMode,
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            mode: TimeoutMode::Finite,
            read_timeout_ms: 200,
            write_timeout_ms: 200,
        }
    }
}

/// Stream window sizes in bytes
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BufferConfig {
    pub input_capacity: usize,
    pub output_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            input_capacity: 4096,
            output_capacity: 4096,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `trace`, `debug`, `info`, `warn`, `error`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
