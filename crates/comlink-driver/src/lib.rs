// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # comlink-driver
//!
//! The driver capability consumed by the comlink buffering engine.
//!
//! A driver represents a raw serial-style link. It only offers primitive,
//! possibly-partial, timeout-bounded transfers:
//!
//! - `read_some` / `write_some` may move fewer bytes than asked for
//! - a return of `0` means "no progress this call", never end-of-stream
//! - `cancel` may be called from another thread (through a [`CancelToken`])
//!   to release a call that is blocked inside the driver
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ comlink-io (BufferedDuplex / SerialStream)   │
//! └─────────────────┬────────────────────────────┘
//!                   │ borrows &mut D
//! ┌─────────────────▼────────────────────────────┐
//! │ SerialDriver trait (THIS CRATE)              │
//! │ - open() / close() / configure()             │
//! │ - read_some() / write_some()                 │
//! │ - cancel_token()                             │
//! └─────────────────┬────────────────────────────┘
//!                   │ implements
//! ┌─────────────────▼────────────────────────────┐
//! │ LoopbackDriver (in-memory)                   │
//! │ Platform drivers (outside this workspace)    │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use comlink_driver::{IoTimeout, LoopbackDriver, SerialDriver};
//!
//! let mut driver = LoopbackDriver::new();
//! driver.open_with_baud("LOOPBACK", 115_200).unwrap();
//!
//! assert_eq!(driver.write_some(b"ping", IoTimeout::IMMEDIATE).unwrap(), 4);
//!
//! let mut buf = [0u8; 8];
//! let got = driver.read_some(&mut buf, IoTimeout::IMMEDIATE).unwrap();
//! assert_eq!(&buf[..got], b"ping");
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cancel;
pub mod driver;
pub mod error;
pub mod loopback;
pub mod policy;
pub mod settings;

pub use cancel::{Cancel, CancelToken};
pub use driver::SerialDriver;
pub use error::{DriverError, DriverResult};
pub use loopback::LoopbackDriver;
pub use policy::{IoTimeout, TimeoutMode, TimeoutPolicy};
pub use settings::{Parity, SerialSettings, StopBits};
