// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Stream facade
//!
//! [`SerialStream`] is the caller-facing surface: block, byte and line reads,
//! buffered writes and flushes, plus `std::io` trait impls. Every buffering
//! decision is made by the [`BufferedDuplex`] underneath.
//!
//! ## std::io mapping
//!
//! In `std::io`, `Ok(0)` from `read` means end-of-file. A serial link never
//! ends by itself, so "no data within the timeout" is reported as
//! `ErrorKind::WouldBlock` instead, and an incomplete `flush` likewise.

use std::io::{self, SeekFrom};

use comlink_driver::{SerialDriver, TimeoutPolicy};

use crate::duplex::{BufferedDuplex, FlushOutcome, StreamOptions};
use crate::error::{StreamError, StreamResult};

/// Progress of a line read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    /// The delimiter was found; the line buffer holds the whole line
    Complete,
    /// No delimiter yet; bytes read so far were appended to the line buffer
    Pending,
}

/// Buffered serial stream
pub struct SerialStream<'d, D: SerialDriver + ?Sized> {
    inner: BufferedDuplex<'d, D>,
}

impl<'d, D: SerialDriver + ?Sized> SerialStream<'d, D> {
    pub fn new(driver: &'d mut D) -> Self {
        Self {
            inner: BufferedDuplex::new(driver),
        }
    }

    pub fn with_options(driver: &'d mut D, options: StreamOptions) -> StreamResult<Self> {
        Ok(Self {
            inner: BufferedDuplex::with_options(driver, options)?,
        })
    }

    pub fn from_duplex(inner: BufferedDuplex<'d, D>) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &BufferedDuplex<'d, D> {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut BufferedDuplex<'d, D> {
        &mut self.inner
    }

    pub fn into_inner(self) -> BufferedDuplex<'d, D> {
        self.inner
    }

    /// Buffer bytes for sending; see [`BufferedDuplex::write`]
    pub fn write(&mut self, bytes: &[u8]) -> StreamResult<usize> {
        self.inner.write(bytes)
    }

    pub fn flush(&mut self) -> StreamResult<FlushOutcome> {
        self.inner.flush()
    }

    /// Read up to `n` bytes; fewer means no more data arrived in time
    pub fn read_exact(&mut self, n: usize) -> StreamResult<Vec<u8>> {
        let mut bytes = vec![0u8; n];
        let got = self.inner.read_block(&mut bytes)?;
        bytes.truncate(got);
        Ok(bytes)
    }

    pub fn read_byte(&mut self) -> StreamResult<Option<u8>> {
        self.inner.read_byte()
    }

    /// Read until `delimiter`, appending to `line`
    ///
    /// On [`LineStatus::Complete`] `line` holds everything up to (not including)
    /// the delimiter, which has been consumed. On [`LineStatus::Pending`] the
    /// bytes read so far are kept in `line`; pass the same buffer again to
    /// continue. Clear `line` before starting the next line.
    pub fn read_line(&mut self, delimiter: u8, line: &mut Vec<u8>) -> StreamResult<LineStatus> {
        loop {
            let buffered = self.inner.fill_buf()?;
            if buffered.is_empty() {
                return Ok(LineStatus::Pending);
            }
            match buffered.iter().position(|&b| b == delimiter) {
                Some(end) => {
                    line.extend_from_slice(&buffered[..end]);
                    self.inner.consume(end + 1);
                    return Ok(LineStatus::Complete);
                }
                None => {
                    let taken = buffered.len();
                    line.extend_from_slice(buffered);
                    self.inner.consume(taken);
                }
            }
        }
    }

    /// Like [`read_line`](Self::read_line), returning a completed line as a
    /// `String` and leaving `line` empty
    ///
    /// # Errors
    ///
    /// `StreamError::InvalidUtf8` if the completed line is not UTF-8.
    pub fn read_line_string(
        &mut self,
        delimiter: u8,
        line: &mut Vec<u8>,
    ) -> StreamResult<Option<String>> {
        match self.read_line(delimiter, line)? {
            LineStatus::Complete => Ok(Some(String::from_utf8(std::mem::take(line))?)),
            LineStatus::Pending => Ok(None),
        }
    }

    pub fn sync(&mut self) -> StreamResult<FlushOutcome> {
        self.inner.sync()
    }

    pub fn seek(&mut self, pos: SeekFrom) -> StreamResult<u64> {
        self.inner.seek(pos)
    }

    pub fn timeout_policy(&self) -> TimeoutPolicy {
        self.inner.timeout_policy()
    }

    pub fn set_timeout_policy(&mut self, policy: TimeoutPolicy) {
        self.inner.set_timeout_policy(policy);
    }

    /// See [`BufferedDuplex::finish`]
    pub fn finish(self) -> StreamResult<()> {
        self.inner.finish()
    }
}

impl<D: SerialDriver + ?Sized> std::fmt::Debug for SerialStream<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialStream")
            .field("inner", &self.inner)
            .finish()
    }
}

fn would_block(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::WouldBlock, what.to_string())
}

impl<D: SerialDriver + ?Sized> io::Read for SerialStream<'_, D> {
    /// Never returns `Ok(0)` for a non-empty `buf`; no data is `WouldBlock`
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let buffered = self.inner.fill_buf()?;
        if buffered.is_empty() {
            return Err(would_block("no data within read timeout"));
        }
        let n = buffered.len().min(buf.len());
        buf[..n].copy_from_slice(&buffered[..n]);
        self.inner.consume(n);
        Ok(n)
    }
}

impl<D: SerialDriver + ?Sized> io::BufRead for SerialStream<'_, D> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        let buffered = self.inner.fill_buf()?;
        if buffered.is_empty() {
            return Err(would_block("no data within read timeout"));
        }
        Ok(buffered)
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt);
    }
}

impl<D: SerialDriver + ?Sized> io::Write for SerialStream<'_, D> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.inner.write(buf)? {
            0 => Err(would_block("output window full and driver stalled")),
            n => Ok(n),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let outcome = self.inner.flush()?;
        if outcome.is_complete() {
            Ok(())
        } else {
            Err(would_block("flush stalled with bytes pending"))
        }
    }
}

impl<D: SerialDriver + ?Sized> io::Seek for SerialStream<'_, D> {
    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(StreamError::Unseekable.into())
    }
}
