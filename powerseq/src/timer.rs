/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Sleep abstraction for every delay in the sequence.
//!
//! Heartbeat periods, grace delays and the idle poll all go through
//! [`Timer::sleep`].  [`TokioTimer`] is the production implementation; since
//! it is built on `tokio::time::sleep`, tests running on a paused runtime
//! (`#[tokio::test(start_paused = true)]`) advance through a 60 s grace delay
//! instantly.

use std::future::Future;
use std::time::Duration;

pub trait Timer: Clone + Send + Sync + 'static {
    /// Wait for `duration`.  Not cancellable by the caller.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// `tokio::time` backed timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

impl Timer for TokioTimer {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Timer double that records every requested sleep and returns immediately.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingTimer {
    sleeps: std::sync::Arc<std::sync::Mutex<Vec<Duration>>>,
}

#[cfg(test)]
impl RecordingTimer {
    pub(crate) fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Timer for RecordingTimer {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        self.sleeps.lock().unwrap().push(duration);
        std::future::ready(())
    }
}

/// Assert that `actual` is no earlier than `expected` and only slightly later.
///
/// The paused clock rounds each deadline up to a whole millisecond, so long
/// chains of sleeps may drift by a millisecond per sleep.
#[cfg(test)]
pub(crate) fn assert_near(actual: Duration, expected: Duration) {
    let slack = Duration::from_millis(5) + expected / 500;
    assert!(
        actual >= expected && actual <= expected + slack,
        "expected ~{expected:?}, got {actual:?}"
    );
}
