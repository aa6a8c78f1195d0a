// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-memory loopback driver
//!
//! Two flavours:
//! - [`LoopbackDriver::new`]: a single port whose writes come back on its own reads
//! - [`LoopbackDriver::pair`]: two cross-connected ports (A's writes are B's reads)
//!
//! Each direction can be bounded with a capacity so that writers stall once
//! the peer stops reading, which is how flush stalls are exercised in tests.
//! Waits honour the resolved [`IoTimeout`] and are released by the
//! [`CancelToken`] from any thread.

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace};

use crate::cancel::{Cancel, CancelToken};
use crate::driver::SerialDriver;
use crate::error::{DriverError, DriverResult};
use crate::policy::{IoTimeout, TimeoutPolicy};
use crate::settings::SerialSettings;

/// One direction of the link
struct Channel {
    queue: Mutex<VecDeque<u8>>,
    changed: Condvar,
    capacity: usize,
}

impl Channel {
    fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            changed: Condvar::new(),
            capacity,
        })
    }
}

/// Shared state of one port: where it reads from, where it writes to, and
/// the cancellation epoch of its in-flight calls
struct Endpoint {
    rx: Arc<Channel>,
    tx: Arc<Channel>,
    epoch: AtomicU64,
}

impl Endpoint {
    fn new(rx: Arc<Channel>, tx: Arc<Channel>) -> Arc<Self> {
        Arc::new(Self {
            rx,
            tx,
            epoch: AtomicU64::new(0),
        })
    }

    fn cancelled_since(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::Acquire) != epoch
    }

    /// Wait for `channel` to change.
    ///
    /// Returns `false` once the caller should give up: the call was cancelled,
    /// the wait is immediate, or the deadline has passed.
    fn wait(
        &self,
        channel: &Channel,
        queue: &mut MutexGuard<'_, VecDeque<u8>>,
        epoch: u64,
        deadline: Option<Instant>,
    ) -> bool {
        if self.cancelled_since(epoch) {
            return false;
        }
        match deadline {
            None => channel.changed.wait(queue),
            Some(deadline) => {
                if Instant::now() >= deadline {
                    return false;
                }
                channel.changed.wait_until(queue, deadline);
            }
        }
        true
    }
}

impl Cancel for Endpoint {
    fn cancel(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        // Taking each lock orders the epoch bump against waiters that are
        // between their epoch check and their condvar wait.
        for channel in [&self.rx, &self.tx] {
            let _queue = channel.queue.lock();
            channel.changed.notify_all();
        }
    }
}

/// In-memory [`SerialDriver`]
pub struct LoopbackDriver {
    endpoint: Arc<Endpoint>,
    port: Option<String>,
    settings: SerialSettings,
    policy: TimeoutPolicy,
}

impl LoopbackDriver {
    /// Unbounded self-loop, closed until [`open`](SerialDriver::open) is called
    pub fn new() -> Self {
        Self::with_capacity(usize::MAX)
    }

    /// Self-loop holding at most `capacity` unread bytes
    pub fn with_capacity(capacity: usize) -> Self {
        let channel = Channel::new(capacity);
        Self::from_endpoint(Endpoint::new(channel.clone(), channel))
    }

    /// Create and open a self-loop in one step
    pub fn open_new(
        port: &str,
        settings: &SerialSettings,
        policy: &TimeoutPolicy,
    ) -> DriverResult<Self> {
        let mut driver = Self::new();
        driver.open(port, settings, policy)?;
        Ok(driver)
    }

    /// Two open, cross-connected, unbounded ports
    pub fn pair() -> (Self, Self) {
        Self::pair_with_capacity(usize::MAX)
    }

    /// Two open, cross-connected ports; each direction holds at most `capacity` bytes
    pub fn pair_with_capacity(capacity: usize) -> (Self, Self) {
        let a_to_b = Channel::new(capacity);
        let b_to_a = Channel::new(capacity);

        let mut a = Self::from_endpoint(Endpoint::new(b_to_a.clone(), a_to_b.clone()));
        let mut b = Self::from_endpoint(Endpoint::new(a_to_b, b_to_a));
        a.port = Some("LOOPBACK-A".to_string());
        b.port = Some("LOOPBACK-B".to_string());
        (a, b)
    }

    /// Maximum number of unread bytes in the outgoing direction
    pub fn capacity(&self) -> usize {
        self.endpoint.tx.capacity
    }

    fn from_endpoint(endpoint: Arc<Endpoint>) -> Self {
        Self {
            endpoint,
            port: None,
            settings: SerialSettings::default(),
            policy: TimeoutPolicy::default(),
        }
    }

    fn ensure_open(&self) -> DriverResult<()> {
        if self.port.is_some() {
            Ok(())
        } else {
            Err(DriverError::NotOpen)
        }
    }
}

impl Default for LoopbackDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LoopbackDriver {
    fn drop(&mut self) {
        self.close();
    }
}

impl SerialDriver for LoopbackDriver {
    fn open(
        &mut self,
        port: &str,
        settings: &SerialSettings,
        policy: &TimeoutPolicy,
    ) -> DriverResult<()> {
        if port.is_empty() {
            return Err(DriverError::Open {
                port: port.to_string(),
                reason: "port name is empty".to_string(),
            });
        }
        settings.validate()?;

        self.close();

        self.settings = *settings;
        self.policy = *policy;
        self.port = Some(port.to_string());

        info!("🦀 [LOOPBACK] Opened {} at {}", port, settings);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn close(&mut self) {
        if let Some(port) = self.port.take() {
            let mut queue = self.endpoint.rx.queue.lock();
            queue.clear();
            self.endpoint.rx.changed.notify_all();
            info!("🦀 [LOOPBACK] Closed {}", port);
        }
    }

    fn configure(&mut self, settings: &SerialSettings) -> DriverResult<()> {
        self.ensure_open()?;
        settings.validate()?;
        self.settings = *settings;
        debug!("[LOOPBACK] Line coding set to {}", settings);
        Ok(())
    }

    fn set_timeout_policy(&mut self, policy: TimeoutPolicy) {
        self.policy = policy;
    }

    fn timeout_policy(&self) -> TimeoutPolicy {
        self.policy
    }

    fn settings(&self) -> SerialSettings {
        self.settings
    }

    fn port_name(&self) -> Option<&str> {
        self.port.as_deref()
    }

    fn read_some(&mut self, dst: &mut [u8], timeout: IoTimeout) -> DriverResult<usize> {
        self.ensure_open()?;
        if dst.is_empty() {
            return Ok(0);
        }

        let endpoint = &self.endpoint;
        let epoch = endpoint.epoch.load(Ordering::Acquire);
        let deadline = timeout.deadline_from(Instant::now());

        let mut queue = endpoint.rx.queue.lock();
        loop {
            if !queue.is_empty() {
                let n = dst.len().min(queue.len());
                for (slot, byte) in dst.iter_mut().zip(queue.drain(..n)) {
                    *slot = byte;
                }
                // Space was freed for a writer waiting on a bounded channel
                endpoint.rx.changed.notify_all();
                trace!("[LOOPBACK] read {} bytes", n);
                return Ok(n);
            }
            if !endpoint.wait(&endpoint.rx, &mut queue, epoch, deadline) {
                return Ok(0);
            }
        }
    }

    fn write_some(&mut self, src: &[u8], timeout: IoTimeout) -> DriverResult<usize> {
        self.ensure_open()?;
        if src.is_empty() {
            return Ok(0);
        }

        let endpoint = &self.endpoint;
        let epoch = endpoint.epoch.load(Ordering::Acquire);
        let deadline = timeout.deadline_from(Instant::now());

        let mut queue = endpoint.tx.queue.lock();
        loop {
            let room = endpoint.tx.capacity.saturating_sub(queue.len());
            if room > 0 {
                let n = room.min(src.len());
                queue.extend(&src[..n]);
                endpoint.tx.changed.notify_all();
                trace!("[LOOPBACK] wrote {} bytes", n);
                return Ok(n);
            }
            if !endpoint.wait(&endpoint.tx, &mut queue, epoch, deadline) {
                return Ok(0);
            }
        }
    }

    fn bytes_ready_hint(&self) -> usize {
        if self.port.is_none() {
            return 0;
        }
        self.endpoint.rx.queue.lock().len()
    }

    fn cancel_token(&self) -> CancelToken {
        CancelToken::new(self.endpoint.clone())
    }
}
