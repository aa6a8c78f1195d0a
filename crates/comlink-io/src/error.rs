// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Stream error types
//!
//! "No data now" and "write stalled" are not errors; they are reported through
//! [`Refill`](crate::Refill), [`FlushOutcome`](crate::FlushOutcome),
//! [`LineStatus`](crate::LineStatus) and short counts.

use comlink_driver::DriverError;
use std::io;

/// Result type alias for stream operations
pub type StreamResult<T> = Result<T, StreamError>;

/// Stream-level error type
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Failure reported by the driver
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Serial links have no addressable offset
    #[error("Serial streams are not seekable")]
    Unseekable,

    /// I/O issued against a driver that was never opened or has been closed
    #[error("Driver is not open")]
    NotOpen,

    /// A window was configured with an unusable capacity
    #[error("Invalid {window} buffer capacity: {capacity}")]
    InvalidCapacity {
        window: &'static str,
        capacity: usize,
    },

    /// Bytes were still pending when the stream was finished
    #[error("{remaining} buffered bytes could not be flushed")]
    Unflushed { remaining: usize },

    /// A completed line is not valid UTF-8
    #[error("Line is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        let kind = match &err {
            StreamError::Driver(DriverError::Io(inner)) => inner.kind(),
            StreamError::Driver(DriverError::NotOpen) | StreamError::NotOpen => {
                io::ErrorKind::NotConnected
            }
            StreamError::Driver(DriverError::InvalidSettings(_))
            | StreamError::InvalidCapacity { .. } => io::ErrorKind::InvalidInput,
            StreamError::Driver(DriverError::Open { .. }) => io::ErrorKind::Other,
            StreamError::Unseekable => io::ErrorKind::Unsupported,
            StreamError::Unflushed { .. } => io::ErrorKind::WriteZero,
            StreamError::InvalidUtf8(_) => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}
