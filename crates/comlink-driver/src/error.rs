// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Driver error types
//!
//! Only genuine failures are errors. A transfer that moves zero bytes
//! (timeout, non-blocking poll, device not ready, cancelled call) is reported
//! as `Ok(0)` by the driver, never through this type.

/// Result type alias for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors reported by a [`SerialDriver`](crate::SerialDriver)
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The port could not be opened (absent device, permission denied, already in use)
    #[error("Failed to open port {port}: {reason}")]
    Open { port: String, reason: String },

    /// I/O was issued against a driver that was never opened or has been closed
    #[error("Port is not open")]
    NotOpen,

    /// The line settings are not supported by the device
    #[error("Invalid serial settings: {0}")]
    InvalidSettings(String),

    /// Platform I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriverError {
    /// Whether this error is a resource error (fatal to the operation, not retried)
    pub fn is_resource_error(&self) -> bool {
        matches!(self, Self::Open { .. } | Self::InvalidSettings(_) | Self::Io(_))
    }
}
