// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Cross-thread cancellation of in-flight driver calls
//!
//! A stream borrows its driver mutably, so another thread cannot reach the
//! driver itself while a read is blocked. Drivers hand out a [`CancelToken`]
//! up front instead; calling [`CancelToken::cancel`] from any thread makes the
//! blocked `read_some` / `write_some` return with whatever it has (usually 0).

use std::fmt;
use std::sync::Arc;

/// Driver-side cancellation hook
pub trait Cancel: Send + Sync {
    /// Release every driver call currently in flight
    fn cancel(&self);
}

/// Cloneable, thread-safe handle that cancels in-flight driver calls
#[derive(Clone)]
pub struct CancelToken {
    target: Arc<dyn Cancel>,
}

impl CancelToken {
    pub fn new(target: Arc<dyn Cancel>) -> Self {
        Self { target }
    }

    /// Token for drivers whose calls never block
    pub fn noop() -> Self {
        Self::new(Arc::new(NoopCancel))
    }

    /// Abort the driver call in flight, if any
    pub fn cancel(&self) {
        self.target.cancel();
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken").finish_non_exhaustive()
    }
}

struct NoopCancel;

impl Cancel for NoopCancel {
    fn cancel(&self) {}
}
