// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Fixed-capacity input and output windows

/// Input window: unread bytes are `buf[pos..len]`
///
/// Invariant: `pos <= len <= buf.len()`. A refill replaces the whole valid
/// region and is only allowed once every byte has been read (`pos == len`).
pub(crate) struct InputWindow {
    buf: Box<[u8]>,
    pos: usize,
    len: usize,
}

impl InputWindow {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity].into_boxed_slice(),
            pos: 0,
            len: 0,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn available(&self) -> usize {
        self.len - self.pos
    }

    pub(crate) fn is_drained(&self) -> bool {
        self.pos == self.len
    }

    pub(crate) fn unread(&self) -> &[u8] {
        &self.buf[self.pos..self.len]
    }

    /// Whole buffer, handed to the driver for a refill
    pub(crate) fn refill_target(&mut self) -> &mut [u8] {
        debug_assert!(self.is_drained(), "refill of a window with unread bytes");
        &mut self.buf
    }

    /// Mark `[0, filled)` as the new valid region
    pub(crate) fn set_filled(&mut self, filled: usize) {
        debug_assert!(filled <= self.buf.len());
        self.pos = 0;
        self.len = filled.min(self.buf.len());
    }

    /// Copy unread bytes into `dst`, returning how many were copied
    pub(crate) fn take_into(&mut self, dst: &mut [u8]) -> usize {
        let n = self.available().min(dst.len());
        dst[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        n
    }

    pub(crate) fn consume(&mut self, amt: usize) {
        self.pos = (self.pos + amt).min(self.len);
    }
}

/// Output window: unsent bytes are `buf[..pending]`, always left-aligned
pub(crate) struct OutputWindow {
    buf: Box<[u8]>,
    pending: usize,
}

impl OutputWindow {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity].into_boxed_slice(),
            pending: 0,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending
    }

    pub(crate) fn free(&self) -> usize {
        self.buf.len() - self.pending
    }

    pub(crate) fn is_full(&self) -> bool {
        self.pending == self.buf.len()
    }

    pub(crate) fn pending_bytes(&self) -> &[u8] {
        &self.buf[..self.pending]
    }

    /// Append as much of `src` as fits, returning how many bytes were taken
    pub(crate) fn append(&mut self, src: &[u8]) -> usize {
        let n = self.free().min(src.len());
        self.buf[self.pending..self.pending + n].copy_from_slice(&src[..n]);
        self.pending += n;
        n
    }

    /// Drop the first `sent` pending bytes and move the rest to the front
    pub(crate) fn discard_sent(&mut self, sent: usize) {
        let sent = sent.min(self.pending);
        self.buf.copy_within(sent..self.pending, 0);
        self.pending -= sent;
    }

    pub(crate) fn clear(&mut self) {
        self.pending = 0;
    }
}
