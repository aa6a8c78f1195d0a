// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Buffered duplex engine
//!
//! [`BufferedDuplex`] owns one input window and one output window and decides
//! when the driver is called:
//!
//! - **read side**: only when every buffered byte has been consumed (refill)
//! - **write side**: when the output window is full, when its free space drops
//!   below [`LOW_WATER_MARK`], or when the caller flushes
//!
//! Timeouts are resolved from the driver's current [`TimeoutPolicy`] on every
//! call, so a policy change applies to the next driver call and never touches
//! bytes that are already buffered.
//!
//! ## Stalls
//!
//! A driver returning `0` is "no progress", not an error and not end-of-stream.
//! Reads report it as [`Refill::NoData`] / a short count; flushes report it as
//! [`FlushOutcome::Stalled`] or [`FlushOutcome::Partial`] and keep every unsent
//! byte, in order, for the next attempt.

use std::io::SeekFrom;

use comlink_driver::{IoTimeout, SerialDriver, TimeoutPolicy};
use tracing::{debug, trace, warn};

use crate::error::{StreamError, StreamResult};
use crate::window::{InputWindow, OutputWindow};

/// Default capacity of each window in bytes
pub const DEFAULT_CAPACITY: usize = 4096;

/// Free output space below which a write triggers a flush
pub const LOW_WATER_MARK: usize = 64;

/// Window sizes for a [`BufferedDuplex`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    pub input_capacity: usize,
    pub output_capacity: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            input_capacity: DEFAULT_CAPACITY,
            output_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl StreamOptions {
    /// Options with both windows at `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            input_capacity: capacity,
            output_capacity: capacity,
        }
    }

    pub fn input_capacity(mut self, capacity: usize) -> Self {
        self.input_capacity = capacity;
        self
    }

    pub fn output_capacity(mut self, capacity: usize) -> Self {
        self.output_capacity = capacity;
        self
    }

    /// Reject zero-sized windows
    pub fn validate(&self) -> StreamResult<()> {
        if self.input_capacity == 0 {
            return Err(StreamError::InvalidCapacity {
                window: "input",
                capacity: self.input_capacity,
            });
        }
        if self.output_capacity == 0 {
            return Err(StreamError::InvalidCapacity {
                window: "output",
                capacity: self.output_capacity,
            });
        }
        Ok(())
    }
}

/// Result of a refill attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refill {
    /// This many unread bytes are now buffered
    Filled(usize),
    /// The driver returned nothing within the read timeout
    NoData,
}

/// Result of a flush attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Every pending byte reached the driver
    Complete { written: usize },
    /// Some bytes were sent before the driver stopped accepting
    Partial { written: usize, remaining: usize },
    /// The driver accepted nothing
    Stalled { remaining: usize },
}

impl FlushOutcome {
    /// Bytes handed to the driver by this flush
    pub fn written(&self) -> usize {
        match *self {
            FlushOutcome::Complete { written } | FlushOutcome::Partial { written, .. } => written,
            FlushOutcome::Stalled { .. } => 0,
        }
    }

    /// Bytes still pending after this flush
    pub fn remaining(&self) -> usize {
        match *self {
            FlushOutcome::Complete { .. } => 0,
            FlushOutcome::Partial { remaining, .. } | FlushOutcome::Stalled { remaining } => {
                remaining
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.remaining() == 0
    }

    /// Whether a writer should keep going after this flush
    pub fn made_progress(&self) -> bool {
        self.written() > 0 || self.remaining() == 0
    }
}

/// Buffered duplex stream over a borrowed [`SerialDriver`]
///
/// The engine never opens or closes the driver. Dropping it attempts one
/// final flush; use [`finish`](Self::finish) to learn whether that worked.
pub struct BufferedDuplex<'d, D: SerialDriver + ?Sized> {
    driver: &'d mut D,
    input: InputWindow,
    output: OutputWindow,
}

impl<'d, D: SerialDriver + ?Sized> BufferedDuplex<'d, D> {
    /// Engine with [`DEFAULT_CAPACITY`] windows
    pub fn new(driver: &'d mut D) -> Self {
        Self::build(driver, StreamOptions::default())
    }

    /// Engine with explicit window sizes
    ///
    /// # Errors
    ///
    /// Returns `StreamError::InvalidCapacity` for a zero-sized window.
    pub fn with_options(driver: &'d mut D, options: StreamOptions) -> StreamResult<Self> {
        options.validate()?;
        Ok(Self::build(driver, options))
    }

    pub fn with_capacities(
        driver: &'d mut D,
        input_capacity: usize,
        output_capacity: usize,
    ) -> StreamResult<Self> {
        Self::with_options(
            driver,
            StreamOptions {
                input_capacity,
                output_capacity,
            },
        )
    }

    fn build(driver: &'d mut D, options: StreamOptions) -> Self {
        trace!(
            "[COMLINK-IO] New duplex: input={} output={}",
            options.input_capacity,
            options.output_capacity
        );
        Self {
            driver,
            input: InputWindow::with_capacity(options.input_capacity),
            output: OutputWindow::with_capacity(options.output_capacity),
        }
    }

    fn ensure_open(&self) -> StreamResult<()> {
        if self.driver.is_open() {
            Ok(())
        } else {
            Err(StreamError::NotOpen)
        }
    }

    // ------------------------------------------------------------------
    // Timeout policy
    // ------------------------------------------------------------------

    pub fn timeout_policy(&self) -> TimeoutPolicy {
        self.driver.timeout_policy()
    }

    /// Replace the driver's timeout policy; the next driver call uses it
    pub fn set_timeout_policy(&mut self, policy: TimeoutPolicy) {
        debug!("[COMLINK-IO] Timeout policy set to {:?}", policy.mode);
        self.driver.set_timeout_policy(policy);
    }

    /// Timeout the next refill will use
    pub fn read_timeout(&self) -> IoTimeout {
        self.driver.timeout_policy().resolved_read()
    }

    /// Timeout the next flush will use
    pub fn write_timeout(&self) -> IoTimeout {
        self.driver.timeout_policy().resolved_write()
    }

    // ------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------

    /// Refill the input window if it is empty
    ///
    /// With unread bytes still buffered this is a no-op that reports them.
    ///
    /// # Errors
    ///
    /// `StreamError::NotOpen` if a refill is needed and the driver is closed;
    /// driver failures are passed through.
    pub fn refill(&mut self) -> StreamResult<Refill> {
        if !self.input.is_drained() {
            return Ok(Refill::Filled(self.input.available()));
        }
        self.ensure_open()?;

        let timeout = self.read_timeout();
        let filled = self.driver.read_some(self.input.refill_target(), timeout)?;
        self.input.set_filled(filled);

        if filled == 0 {
            trace!("[COMLINK-IO] Refill: no data within {:?}", timeout);
            Ok(Refill::NoData)
        } else {
            trace!("[COMLINK-IO] Refill: {} bytes", filled);
            Ok(Refill::Filled(filled))
        }
    }

    /// Read up to `dst.len()` bytes, refilling as needed
    ///
    /// Stops at the first refill that yields nothing, so a short count (even 0)
    /// means "no more data right now", never end-of-stream.
    pub fn read_block(&mut self, dst: &mut [u8]) -> StreamResult<usize> {
        let mut copied = 0;
        while copied < dst.len() {
            if self.input.is_drained() {
                match self.refill() {
                    Ok(Refill::Filled(_)) => {}
                    Ok(Refill::NoData) => break,
                    Err(err) if copied > 0 => {
                        // Surface the error on the next call, keep what was read
                        debug!("[COMLINK-IO] Read stopped after {} bytes: {}", copied, err);
                        break;
                    }
                    Err(err) => return Err(err),
                }
            }
            copied += self.input.take_into(&mut dst[copied..]);
        }
        Ok(copied)
    }

    /// Read one byte; `None` means no data right now
    pub fn read_byte(&mut self) -> StreamResult<Option<u8>> {
        let mut byte = [0u8; 1];
        let got = self.read_block(&mut byte)?;
        Ok((got == 1).then_some(byte[0]))
    }

    /// Buffered unread bytes, refilling first if there are none
    ///
    /// An empty slice means no data arrived within the read timeout.
    pub fn fill_buf(&mut self) -> StreamResult<&[u8]> {
        self.refill()?;
        Ok(self.input.unread())
    }

    /// Mark `amt` buffered bytes as read
    pub fn consume(&mut self, amt: usize) {
        self.input.consume(amt);
    }

    /// Unread bytes already buffered (never touches the driver)
    pub fn buffered(&self) -> &[u8] {
        self.input.unread()
    }

    // ------------------------------------------------------------------
    // Write side
    // ------------------------------------------------------------------

    /// Buffer `src`, flushing whenever the output window fills up
    ///
    /// Returns how many bytes were accepted (buffered or sent). The count is
    /// short only when a flush could not make progress.
    ///
    /// # Errors
    ///
    /// `StreamError::NotOpen` if `src` is non-empty and the driver is closed;
    /// nothing is buffered in that case.
    pub fn write(&mut self, src: &[u8]) -> StreamResult<usize> {
        if src.is_empty() {
            return Ok(0);
        }
        self.ensure_open()?;

        let mut accepted = 0;
        match self.write_into_window(src, &mut accepted) {
            Ok(()) => Ok(accepted),
            Err(err) if accepted > 0 => {
                debug!("[COMLINK-IO] Write stopped after {} bytes: {}", accepted, err);
                Ok(accepted)
            }
            Err(err) => Err(err),
        }
    }

    fn write_into_window(&mut self, src: &[u8], accepted: &mut usize) -> StreamResult<()> {
        while *accepted < src.len() {
            if self.output.is_full() && !self.flush()?.made_progress() {
                break;
            }
            *accepted += self.output.append(&src[*accepted..]);
            if self.output.free() < LOW_WATER_MARK && !self.flush()?.made_progress() {
                break;
            }
        }
        Ok(())
    }

    /// Push pending bytes to the driver until done or until it stops accepting
    ///
    /// Unsent bytes stay at the front of the output window in order.
    ///
    /// # Errors
    ///
    /// `StreamError::NotOpen` if bytes are pending and the driver is closed;
    /// driver failures are passed through after accounting for bytes sent.
    pub fn flush(&mut self) -> StreamResult<FlushOutcome> {
        let pending = self.output.pending();
        if pending == 0 {
            return Ok(FlushOutcome::Complete { written: 0 });
        }
        self.ensure_open()?;

        let timeout = self.write_timeout();
        let mut written = 0;
        let result = loop {
            if written == pending {
                break Ok(());
            }
            match self
                .driver
                .write_some(&self.output.pending_bytes()[written..], timeout)
            {
                Ok(0) => break Ok(()),
                Ok(n) => written += n.min(pending - written),
                Err(err) => break Err(err),
            }
        };
        self.output.discard_sent(written);
        result?;

        let remaining = self.output.pending();
        let outcome = if remaining == 0 {
            FlushOutcome::Complete { written }
        } else if written == 0 {
            FlushOutcome::Stalled { remaining }
        } else {
            FlushOutcome::Partial { written, remaining }
        };
        if remaining > 0 {
            debug!(
                "[COMLINK-IO] Flush stalled: wrote {}, {} bytes retained",
                written, remaining
            );
        }
        Ok(outcome)
    }

    /// Flush without adding bytes; idempotent
    pub fn sync(&mut self) -> StreamResult<FlushOutcome> {
        self.flush()
    }

    /// Serial links have no position; buffers are left untouched
    pub fn seek(&mut self, _pos: SeekFrom) -> StreamResult<u64> {
        Err(StreamError::Unseekable)
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    pub fn input_capacity(&self) -> usize {
        self.input.capacity()
    }

    pub fn output_capacity(&self) -> usize {
        self.output.capacity()
    }

    /// Unsent bytes in the output window
    pub fn pending(&self) -> usize {
        self.output.pending()
    }

    /// Unread bytes in the input window
    pub fn available(&self) -> usize {
        self.input.available()
    }

    pub fn driver(&self) -> &D {
        self.driver
    }

    /// Direct driver access; bypassing the windows can reorder bytes
    pub fn driver_mut(&mut self) -> &mut D {
        self.driver
    }

    /// Flush and report bytes that could not be delivered
    ///
    /// Undelivered bytes are dropped either way.
    ///
    /// # Errors
    ///
    /// `StreamError::Unflushed` when the final flush left bytes behind, or the
    /// error the flush itself failed with.
    pub fn finish(mut self) -> StreamResult<()> {
        let flushed = self.flush();
        let remaining = self.output.pending();
        self.output.clear();
        flushed?;
        if remaining > 0 {
            return Err(StreamError::Unflushed { remaining });
        }
        Ok(())
    }
}

impl<D: SerialDriver + ?Sized> Drop for BufferedDuplex<'_, D> {
    fn drop(&mut self) {
        if self.output.pending() == 0 {
            return;
        }
        match self.flush() {
            Ok(outcome) if outcome.is_complete() => {}
            Ok(outcome) => warn!(
                "[COMLINK-IO] Dropping {} unflushed bytes",
                outcome.remaining()
            ),
            Err(err) => warn!(
                "[COMLINK-IO] Dropping {} unflushed bytes: {}",
                self.output.pending(),
                err
            ),
        }
    }
}

impl<D: SerialDriver + ?Sized> std::fmt::Debug for BufferedDuplex<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferedDuplex")
            .field("input_capacity", &self.input.capacity())
            .field("available", &self.input.available())
            .field("output_capacity", &self.output.capacity())
            .field("pending", &self.output.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comlink_driver::{CancelToken, DriverError, DriverResult, SerialSettings, TimeoutMode};
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Driver that replays scripted read chunks and accepts writes according
    /// to a per-call budget, recording everything it sees
    #[derive(Default)]
    struct ScriptedDriver {
        open: bool,
        policy: TimeoutPolicy,
        reads: VecDeque<Vec<u8>>,
        write_budgets: VecDeque<usize>,
        sent: Vec<u8>,
        read_calls: usize,
        write_calls: usize,
        timeouts: Vec<IoTimeout>,
        fail_writes: bool,
    }

    impl ScriptedDriver {
        fn opened() -> Self {
            Self {
                open: true,
                ..Self::default()
            }
        }
    }

    impl SerialDriver for ScriptedDriver {
        fn open(
            &mut self,
            _port: &str,
            _settings: &SerialSettings,
            policy: &TimeoutPolicy,
        ) -> DriverResult<()> {
            self.open = true;
            self.policy = *policy;
            Ok(())
        }

        fn is_open(&self) -> bool {
            self.open
        }

        fn close(&mut self) {
            self.open = false;
        }

        fn configure(&mut self, _settings: &SerialSettings) -> DriverResult<()> {
            Ok(())
        }

        fn set_timeout_policy(&mut self, policy: TimeoutPolicy) {
            self.policy = policy;
        }

        fn timeout_policy(&self) -> TimeoutPolicy {
            self.policy
        }

        fn settings(&self) -> SerialSettings {
            SerialSettings::default()
        }

        fn port_name(&self) -> Option<&str> {
            self.open.then_some("SCRIPTED")
        }

        fn read_some(&mut self, dst: &mut [u8], timeout: IoTimeout) -> DriverResult<usize> {
            self.read_calls += 1;
            self.timeouts.push(timeout);
            let Some(mut chunk) = self.reads.pop_front() else {
                return Ok(0);
            };
            let n = chunk.len().min(dst.len());
            dst[..n].copy_from_slice(&chunk[..n]);
            if n < chunk.len() {
                self.reads.push_front(chunk.split_off(n));
            }
            Ok(n)
        }

        fn write_some(&mut self, src: &[u8], timeout: IoTimeout) -> DriverResult<usize> {
            self.write_calls += 1;
            self.timeouts.push(timeout);
            if self.fail_writes {
                return Err(DriverError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "unplugged",
                )));
            }
            let budget = self.write_budgets.pop_front().unwrap_or(usize::MAX);
            let n = budget.min(src.len());
            self.sent.extend_from_slice(&src[..n]);
            Ok(n)
        }

        fn bytes_ready_hint(&self) -> usize {
            self.reads.front().map_or(0, Vec::len)
        }

        fn cancel_token(&self) -> CancelToken {
            CancelToken::noop()
        }
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let mut driver = ScriptedDriver::opened();
        let err = BufferedDuplex::with_capacities(&mut driver, 0, 16).unwrap_err();
        assert!(matches!(
            err,
            StreamError::InvalidCapacity {
                window: "input",
                capacity: 0
            }
        ));
        let err = BufferedDuplex::with_capacities(&mut driver, 16, 0).unwrap_err();
        assert!(matches!(err, StreamError::InvalidCapacity { window: "output", .. }));
    }

    #[test]
    fn test_refill_only_when_drained() {
        let mut driver = ScriptedDriver::opened();
        driver.reads.push_back(b"abcd".to_vec());
        driver.reads.push_back(b"efgh".to_vec());

        let mut duplex = BufferedDuplex::new(&mut driver);
        assert_eq!(duplex.refill().unwrap(), Refill::Filled(4));
        duplex.consume(1);
        // Unread bytes left: no driver call
        assert_eq!(duplex.refill().unwrap(), Refill::Filled(3));
        assert_eq!(duplex.buffered(), b"bcd");
        drop(duplex);

        assert_eq!(driver.read_calls, 1);
    }

    #[test]
    fn test_read_block_stops_at_first_empty_refill() {
        let mut driver = ScriptedDriver::opened();
        driver.reads.push_back(b"abc".to_vec());
        driver.reads.push_back(b"de".to_vec());

        let mut duplex = BufferedDuplex::with_capacities(&mut driver, 2, 16).unwrap();
        let mut dst = [0u8; 8];
        assert_eq!(duplex.read_block(&mut dst).unwrap(), 5);
        assert_eq!(&dst[..5], b"abcde");

        assert_eq!(duplex.read_block(&mut dst).unwrap(), 0);
        assert_eq!(duplex.read_byte().unwrap(), None);
        drop(duplex);

        // "ab", "c", "de", then one empty refill per read call
        assert_eq!(driver.read_calls, 6);
    }

    #[test]
    fn test_write_below_threshold_stays_buffered() {
        let mut driver = ScriptedDriver::opened();
        let mut duplex = BufferedDuplex::new(&mut driver);
        assert_eq!(duplex.write(b"hello").unwrap(), 5);
        assert_eq!(duplex.pending(), 5);
        assert_eq!(duplex.driver().write_calls, 0);

        assert_eq!(
            duplex.flush().unwrap(),
            FlushOutcome::Complete { written: 5 }
        );
        drop(duplex);
        assert_eq!(driver.sent, b"hello");
    }

    #[test]
    fn test_low_water_mark_triggers_flush() {
        let mut driver = ScriptedDriver::opened();
        let mut duplex = BufferedDuplex::with_capacities(&mut driver, 16, 128).unwrap();

        // 64 free bytes left: no flush yet
        duplex.write(&[1u8; 64]).unwrap();
        assert_eq!(duplex.driver().write_calls, 0);

        // 63 free bytes left: flush
        duplex.write(&[2u8; 1]).unwrap();
        assert_eq!(duplex.pending(), 0);
        assert_eq!(duplex.driver().sent.len(), 65);
    }

    #[test]
    fn test_flush_partial_then_stalled_keeps_order() {
        let mut driver = ScriptedDriver::opened();
        driver.write_budgets.extend([3, 0, 0]);

        let mut duplex = BufferedDuplex::new(&mut driver);
        duplex.write(b"abcdefgh").unwrap();

        assert_eq!(
            duplex.flush().unwrap(),
            FlushOutcome::Partial {
                written: 3,
                remaining: 5
            }
        );
        let stalled = duplex.flush().unwrap();
        assert_eq!(stalled, FlushOutcome::Stalled { remaining: 5 });
        assert!(!stalled.made_progress());

        assert_eq!(
            duplex.flush().unwrap(),
            FlushOutcome::Complete { written: 5 }
        );
        drop(duplex);
        assert_eq!(driver.sent, b"abcdefgh");
    }

    #[test]
    fn test_write_stops_short_on_stall() {
        let mut driver = ScriptedDriver::opened();
        driver.write_budgets.extend([0, 0, 0, 0]);

        let mut duplex = BufferedDuplex::with_capacities(&mut driver, 16, 8).unwrap();
        // Free space is below the low-water mark at once and that flush stalls
        assert_eq!(duplex.write(b"0123456789").unwrap(), 8);
        assert_eq!(duplex.pending(), 8);
    }

    #[test]
    fn test_empty_sync_does_not_touch_driver() {
        let mut driver = ScriptedDriver::opened();
        let mut duplex = BufferedDuplex::new(&mut driver);
        assert_eq!(duplex.sync().unwrap(), FlushOutcome::Complete { written: 0 });
        assert_eq!(duplex.sync().unwrap(), FlushOutcome::Complete { written: 0 });
        drop(duplex);
        assert_eq!(driver.write_calls, 0);
    }

    #[test]
    fn test_timeouts_follow_current_policy() {
        let mut driver = ScriptedDriver::opened();
        let mut duplex = BufferedDuplex::new(&mut driver);

        duplex.set_timeout_policy(TimeoutPolicy::blocking());
        assert_eq!(duplex.read_timeout(), IoTimeout::Infinite);

        duplex.set_timeout_policy(TimeoutPolicy::finite(
            Duration::from_millis(30),
            Duration::from_millis(40),
        ));
        assert_eq!(duplex.read_timeout(), IoTimeout::After(Duration::from_millis(30)));
        assert_eq!(duplex.write_timeout(), IoTimeout::After(Duration::from_millis(40)));
        duplex.refill().unwrap();

        duplex.set_timeout_policy(TimeoutPolicy::default().with_mode(TimeoutMode::NonBlocking));
        assert_eq!(duplex.read_timeout(), IoTimeout::IMMEDIATE);
        duplex.refill().unwrap();
        drop(duplex);

        assert_eq!(
            driver.timeouts,
            vec![IoTimeout::After(Duration::from_millis(30)), IoTimeout::IMMEDIATE]
        );
    }

    #[test]
    fn test_closed_driver_reports_not_open() {
        let mut driver = ScriptedDriver::opened();
        driver.reads.push_back(b"xy".to_vec());

        let mut duplex = BufferedDuplex::new(&mut driver);
        duplex.refill().unwrap();
        duplex.write(b"q").unwrap();
        duplex.driver_mut().close();

        // Buffered input stays readable
        assert_eq!(duplex.read_byte().unwrap(), Some(b'x'));
        assert_eq!(duplex.read_byte().unwrap(), Some(b'y'));
        assert!(matches!(duplex.read_byte(), Err(StreamError::NotOpen)));

        assert!(matches!(duplex.write(b"z"), Err(StreamError::NotOpen)));
        assert_eq!(duplex.pending(), 1);
        assert!(matches!(duplex.flush(), Err(StreamError::NotOpen)));
        assert!(matches!(duplex.finish(), Err(StreamError::NotOpen)));
    }

    #[test]
    fn test_write_to_unopened_driver_is_rejected() {
        let mut driver = ScriptedDriver::default();

        let mut duplex = BufferedDuplex::new(&mut driver);
        assert!(matches!(duplex.write(b"hello"), Err(StreamError::NotOpen)));
        assert_eq!(duplex.pending(), 0);
        assert_eq!(duplex.write(b"").unwrap(), 0);
        assert!(duplex.finish().is_ok());
        assert_eq!(driver.write_calls, 0);
    }

    #[test]
    fn test_driver_error_keeps_unsent_bytes() {
        let mut driver = ScriptedDriver::opened();
        driver.fail_writes = true;

        let mut duplex = BufferedDuplex::new(&mut driver);
        duplex.write(b"data").unwrap();
        assert!(matches!(duplex.flush(), Err(StreamError::Driver(_))));
        assert_eq!(duplex.pending(), 4);

        duplex.driver_mut().fail_writes = false;
        assert!(duplex.flush().unwrap().is_complete());
    }

    #[test]
    fn test_seek_is_unsupported() {
        let mut driver = ScriptedDriver::opened();
        driver.reads.push_back(b"abc".to_vec());
        let mut duplex = BufferedDuplex::new(&mut driver);
        duplex.refill().unwrap();
        duplex.write(b"out").unwrap();

        assert!(matches!(
            duplex.seek(SeekFrom::Start(0)),
            Err(StreamError::Unseekable)
        ));
        assert_eq!(duplex.buffered(), b"abc");
        assert_eq!(duplex.pending(), 3);
    }

    #[test]
    fn test_finish_reports_unflushed() {
        let mut driver = ScriptedDriver::opened();
        driver.write_budgets.extend([2, 0]);

        let mut duplex = BufferedDuplex::new(&mut driver);
        duplex.write(b"abcdef").unwrap();
        assert!(matches!(
            duplex.finish(),
            Err(StreamError::Unflushed { remaining: 4 })
        ));
        // Nothing retried on drop
        assert_eq!(driver.write_calls, 2);
    }

    #[test]
    fn test_drop_flushes_pending() {
        let mut driver = ScriptedDriver::opened();
        {
            let mut duplex = BufferedDuplex::new(&mut driver);
            duplex.write(b"bye").unwrap();
        }
        assert_eq!(driver.sent, b"bye");
    }
}
