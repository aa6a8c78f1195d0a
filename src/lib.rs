// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # comlink - buffered duplex byte streams over serial-style drivers
//!
//! A serial port only offers partial, timeout-bounded transfers where "zero
//! bytes moved" is routine. comlink puts a fixed pair of windows in front of
//! such a driver so callers get ordered, loss-free reads and writes, explicit
//! flush outcomes, and a clear difference between "no data yet" and an error.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! comlink = "0.1"  # Default: config + observability
//! ```
//!
//! ```rust
//! use comlink::prelude::*;
//!
//! let mut driver = LoopbackDriver::new();
//! driver.open_with_baud("LOOPBACK", 115_200)?;
//!
//! let mut stream = SerialStream::new(&mut driver);
//! stream.write(b"AT\r\n")?;
//! stream.flush()?;
//!
//! let mut line = Vec::new();
//! if stream.read_line(b'\n', &mut line)? == LineStatus::Complete {
//!     assert_eq!(line, b"AT\r");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Feature Flags
//!
//! - **`config`** (default): `comlink.toml` + `COMLINK_*` environment + CLI overrides
//! - **`observability`** (default): tracing subscriber setup with per-crate debug flags
//! - **`file-logging`**: timestamped log folders with retention
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Facade: SerialStream                                   │
//! │  (byte / block / line reads, std::io traits)            │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Engine: BufferedDuplex                                 │
//! │  (input + output windows, refill, flush, timeouts)      │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Driver: SerialDriver (LoopbackDriver, platform ports)  │
//! │  (partial read_some / write_some, cancel token)         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

// Re-export foundation
pub use comlink_driver as driver;
pub use comlink_io as io;

#[cfg(feature = "config")]
pub use comlink_config as config;

#[cfg(feature = "observability")]
pub use comlink_observability as observability;

use comlink_driver::DriverError;
use comlink_io::StreamError;

/// Error type spanning every comlink layer
#[derive(Debug, thiserror::Error)]
pub enum ComlinkError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[cfg(feature = "config")]
    #[error(transparent)]
    Config(#[from] comlink_config::ConfigError),
}

/// Result type alias for umbrella operations
pub type ComlinkResult<T> = Result<T, ComlinkError>;

/// Open `driver` as described by `config` and return the window sizes to
/// build a stream with
///
/// # Errors
///
/// `ComlinkError::Config` if the configuration is invalid, otherwise whatever
/// the driver's `open` reports.
#[cfg(feature = "config")]
pub fn open_with_config<D: comlink_driver::SerialDriver + ?Sized>(
    driver: &mut D,
    config: &comlink_config::ComlinkConfig,
) -> ComlinkResult<comlink_io::StreamOptions> {
    comlink_config::validate_config(config)?;

    let options = comlink_io::StreamOptions {
        input_capacity: config.buffers.input_capacity,
        output_capacity: config.buffers.output_capacity,
    };
    options.validate()?;

    driver.open(
        &config.port.name,
        &config.port.settings,
        &config.timeout_policy(),
    )?;
    tracing::info!(
        "🦀 [COMLINK] {} ready ({:?}, {}/{} byte windows)",
        config.port.name,
        config.timeouts.mode,
        options.input_capacity,
        options.output_capacity
    );
    Ok(options)
}

/// Install console logging at `logging.level`, raised per crate by
/// `--debug-*` arguments and `COMLINK_DEBUG`
#[cfg(all(feature = "config", feature = "observability"))]
pub fn init_logging(config: &comlink_config::ComlinkConfig) -> anyhow::Result<()> {
    let flags = comlink_observability::parse_debug_flags().with_base_level(&config.logging.level);
    comlink_observability::init_console_logging(&flags)
}

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::{ComlinkError, ComlinkResult};
    pub use comlink_driver::{
        CancelToken, IoTimeout, LoopbackDriver, SerialDriver, SerialSettings, TimeoutMode,
        TimeoutPolicy,
    };
    pub use comlink_io::{
        BufferedDuplex, FlushOutcome, LineStatus, Refill, SerialStream, StreamError,
        StreamOptions,
    };

    #[cfg(feature = "config")]
    pub use crate::open_with_config;
    #[cfg(feature = "config")]
    pub use comlink_config::{load_config, ComlinkConfig};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facade_imports() {
        use crate::prelude::*;
        let _options = StreamOptions::default();
        let _policy = TimeoutPolicy::default();
    }

    #[test]
    fn test_error_layers_convert() {
        let err: ComlinkError = StreamError::Unseekable.into();
        assert!(matches!(err, ComlinkError::Stream(StreamError::Unseekable)));

        let err: ComlinkError = DriverError::NotOpen.into();
        assert_eq!(err.to_string(), DriverError::NotOpen.to_string());
    }
}
