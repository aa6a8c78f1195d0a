// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Serial driver capability
//!
//! This module defines the platform-agnostic trait for a serial-style link.
//! Platform implementations (Win32 COM ports, termios ttys, USB CDC) and test
//! doubles implement it; the buffering engine in `comlink-io` only ever talks
//! to this trait.

use crate::cancel::CancelToken;
use crate::error::DriverResult;
use crate::policy::{IoTimeout, TimeoutPolicy};
use crate::settings::SerialSettings;

/// Serial driver trait
///
/// ## Design Principles
///
/// 1. **Partial transfers**: `read_some` / `write_some` move as many bytes as
///    they can within the given timeout, possibly none
/// 2. **Zero is not EOF**: a physical link does not close on its own, so a
///    return of `0` only ever means "no progress this call"
/// 3. **Explicit timeouts**: every transfer receives its resolved
///    [`IoTimeout`]; the stored [`TimeoutPolicy`] is what callers resolve it from
/// 4. **Cancellable**: [`cancel`](SerialDriver::cancel) and the token from
///    [`cancel_token`](SerialDriver::cancel_token) release a blocked call
///
/// ## Thread Safety
///
/// Implementations do NOT need to be `Sync`. Only the [`CancelToken`] crosses
/// threads; it must be safe to fire while the owning thread is blocked inside
/// `read_some` / `write_some`, and must make that call return a partial (possibly
/// zero) result rather than fail or corrupt driver state.
pub trait SerialDriver {
    /// Open the port with full line settings and a timeout policy
    ///
    /// Reopening an open driver closes it first.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::Open` if the device is absent, permission is
    /// denied or the port is already in use, and `DriverError::InvalidSettings`
    /// if the line coding is not supported.
    fn open(
        &mut self,
        port: &str,
        settings: &SerialSettings,
        policy: &TimeoutPolicy,
    ) -> DriverResult<()>;

    /// Open the port with 8N1 at `baud` and the default timeout policy
    fn open_with_baud(&mut self, port: &str, baud: u32) -> DriverResult<()> {
        self.open(port, &SerialSettings::with_baud(baud), &TimeoutPolicy::default())
    }

    /// Check if the port is open
    fn is_open(&self) -> bool;

    /// Close the port (no-op when already closed)
    fn close(&mut self);

    /// Apply new line settings to the open port
    fn configure(&mut self, settings: &SerialSettings) -> DriverResult<()>;

    /// Replace the stored timeout policy; the next transfer uses it
    fn set_timeout_policy(&mut self, policy: TimeoutPolicy);

    /// Current timeout policy
    fn timeout_policy(&self) -> TimeoutPolicy;

    /// Current line settings
    fn settings(&self) -> SerialSettings;

    /// Name of the open port, if any
    fn port_name(&self) -> Option<&str>;

    /// Read up to `dst.len()` bytes
    ///
    /// # Returns
    /// Number of bytes read. `0` means timeout, non-blocking poll with nothing
    /// available, or a cancelled call.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::NotOpen` on a closed port.
    fn read_some(&mut self, dst: &mut [u8], timeout: IoTimeout) -> DriverResult<usize>;

    /// Write up to `src.len()` bytes
    ///
    /// # Returns
    /// Number of bytes written. `0` means the device could not accept anything
    /// within the timeout.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::NotOpen` on a closed port.
    fn write_some(&mut self, src: &[u8], timeout: IoTimeout) -> DriverResult<usize>;

    /// Bytes that can be read without blocking (best-effort, may under-report)
    fn bytes_ready_hint(&self) -> usize;

    /// Handle that cancels in-flight calls from another thread
    fn cancel_token(&self) -> CancelToken;

    /// Cancel any call currently blocked inside the driver
    fn cancel(&self) {
        self.cancel_token().cancel();
    }
}
