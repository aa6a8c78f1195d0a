// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Timeout policy and its resolution into per-call timeouts
//!
//! | Policy mode   | Resolved wait                          |
//! |---------------|----------------------------------------|
//! | `Blocking`    | [`IoTimeout::Infinite`]                |
//! | `Finite`      | `IoTimeout::After(read/write timeout)` |
//! | `NonBlocking` | [`IoTimeout::IMMEDIATE`]               |

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::error::DriverError;

/// How `read_some` / `write_some` calls should wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutMode {
    /// Wait until at least one byte moves (or the call is cancelled)
    Blocking,
    /// Wait up to the configured read/write timeout
    #[default]
    Finite,
    /// Poll once and return immediately
    NonBlocking,
}

/// Timeout policy applied to the next I/O call
///
/// Changing the policy never affects bytes that are already buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    pub mode: TimeoutMode,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            mode: TimeoutMode::Finite,
            read_timeout: Duration::from_millis(200),
            write_timeout: Duration::from_millis(200),
        }
    }
}

impl TimeoutPolicy {
    /// Block until data moves
    pub fn blocking() -> Self {
        Self {
            mode: TimeoutMode::Blocking,
            ..Default::default()
        }
    }

    /// Bounded waits with separate read and write timeouts
    pub fn finite(read_timeout: Duration, write_timeout: Duration) -> Self {
        Self {
            mode: TimeoutMode::Finite,
            read_timeout,
            write_timeout,
        }
    }

    /// Immediate polls
    pub fn non_blocking() -> Self {
        Self {
            mode: TimeoutMode::NonBlocking,
            ..Default::default()
        }
    }

    /// Same durations, different mode
    pub fn with_mode(mut self, mode: TimeoutMode) -> Self {
        self.mode = mode;
        self
    }

    /// Resolved wait for the next `read_some`
    pub fn resolved_read(&self) -> IoTimeout {
        self.resolve(self.read_timeout)
    }

    /// Resolved wait for the next `write_some`
    pub fn resolved_write(&self) -> IoTimeout {
        self.resolve(self.write_timeout)
    }

    fn resolve(&self, stored: Duration) -> IoTimeout {
        match self.mode {
            TimeoutMode::Blocking => IoTimeout::Infinite,
            TimeoutMode::Finite => IoTimeout::After(stored),
            TimeoutMode::NonBlocking => IoTimeout::IMMEDIATE,
        }
    }
}

/// Concrete wait passed to a single driver call
///
/// `Infinite` is its own variant so it can never be confused with a
/// zero-length wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoTimeout {
    Infinite,
    After(Duration),
}

impl IoTimeout {
    /// Zero-length wait (immediate poll)
    pub const IMMEDIATE: IoTimeout = IoTimeout::After(Duration::ZERO);

    pub fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite)
    }

    pub fn is_immediate(&self) -> bool {
        matches!(self, Self::After(d) if d.is_zero())
    }

    /// Finite duration, `None` for an infinite wait
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Infinite => None,
            Self::After(d) => Some(*d),
        }
    }

    /// Deadline for a call starting at `start`, `None` when the wait is unbounded
    ///
    /// Durations too large to represent as an `Instant` are treated as unbounded.
    pub fn deadline_from(&self, start: Instant) -> Option<Instant> {
        match self {
            Self::Infinite => None,
            Self::After(d) => start.checked_add(*d),
        }
    }
}

impl FromStr for TimeoutMode {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "blocking" => Ok(Self::Blocking),
            "finite" => Ok(Self::Finite),
            "non_blocking" | "nonblocking" => Ok(Self::NonBlocking),
            other => Err(DriverError::InvalidSettings(format!(
                "unknown timeout mode '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_table() {
        let read = Duration::from_millis(100);
        let write = Duration::from_millis(250);
        let finite = TimeoutPolicy::finite(read, write);

        assert_eq!(finite.resolved_read(), IoTimeout::After(read));
        assert_eq!(finite.resolved_write(), IoTimeout::After(write));

        let blocking = finite.with_mode(TimeoutMode::Blocking);
        assert_eq!(blocking.resolved_read(), IoTimeout::Infinite);
        assert_eq!(blocking.resolved_write(), IoTimeout::Infinite);

        let polling = finite.with_mode(TimeoutMode::NonBlocking);
        assert!(polling.resolved_read().is_immediate());
        assert!(polling.resolved_write().is_immediate());
    }

    #[test]
    fn test_infinite_is_not_zero() {
        assert_ne!(IoTimeout::Infinite, IoTimeout::IMMEDIATE);
        assert!(!IoTimeout::Infinite.is_immediate());
        assert_eq!(IoTimeout::Infinite.as_duration(), None);
        assert_eq!(IoTimeout::Infinite.deadline_from(Instant::now()), None);
    }

    #[test]
    fn test_default_policy() {
        let policy = TimeoutPolicy::default();
        assert_eq!(policy.mode, TimeoutMode::Finite);
        assert_eq!(policy.read_timeout, Duration::from_millis(200));
        assert_eq!(policy.write_timeout, Duration::from_millis(200));
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("non-blocking".parse::<TimeoutMode>().unwrap(), TimeoutMode::NonBlocking);
        assert_eq!("BLOCKING".parse::<TimeoutMode>().unwrap(), TimeoutMode::Blocking);
        assert!("forever".parse::<TimeoutMode>().is_err());
    }
}
