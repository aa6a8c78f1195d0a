// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # comlink-io
//!
//! Buffered, bidirectional byte stream over a [`SerialDriver`].
//!
//! The driver only offers partial, timeout-bounded transfers where "zero bytes"
//! is a normal outcome. This crate turns that into a stream with:
//!
//! - refill-on-demand reads from a fixed input window
//! - threshold and forced flushes from a fixed output window
//! - no byte ever lost or duplicated by a stalled flush
//! - "no data right now" kept distinct from any notion of end-of-stream
//!
//! ## Layers
//!
//! 1. [`BufferedDuplex`]: the engine (windows, refill, flush, timeout resolution)
//! 2. [`SerialStream`]: the facade (block/byte/line reads, `std::io` traits)
//!
//! ## Example
//!
//! ```rust
//! use comlink_driver::{LoopbackDriver, SerialDriver};
//! use comlink_io::{LineStatus, SerialStream};
//!
//! let mut driver = LoopbackDriver::new();
//! driver.open_with_baud("LOOPBACK", 115_200)?;
//!
//! let mut stream = SerialStream::new(&mut driver);
//! stream.write(b"ATI\r\n")?;
//! assert!(stream.flush()?.is_complete());
//!
//! let mut line = Vec::new();
//! assert_eq!(stream.read_line(b'\n', &mut line)?, LineStatus::Complete);
//! assert_eq!(line, b"ATI\r");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! [`SerialDriver`]: comlink_driver::SerialDriver

pub mod duplex;
pub mod error;
pub mod stream;
mod window;

pub use duplex::{
    BufferedDuplex, FlushOutcome, Refill, StreamOptions, DEFAULT_CAPACITY, LOW_WATER_MARK,
};
pub use error::{StreamError, StreamResult};
pub use stream::{LineStatus, SerialStream};
