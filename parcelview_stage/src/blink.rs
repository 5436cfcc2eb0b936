// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A repeating task that owns at most one live timer.

use core::time::Duration;

use crate::host::Scheduler;

/// At most one live repeating timer, tracked by its handle.
///
/// [`start`](Self::start) cancels the previous timer before scheduling a new one,
/// and [`stop`](Self::stop) is safe to call any number of times. Ticks from a
/// handle other than the current one are stale and should be ignored; use
/// [`is_current`](Self::is_current) to tell them apart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepeatingTask<H> {
    handle: Option<H>,
}

impl<H> Default for RepeatingTask<H> {
    fn default() -> Self {
        Self { handle: None }
    }
}

impl<H: Copy + Eq> RepeatingTask<H> {
    /// Create a stopped task.
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)start the task with `period`, replacing any live timer.
    pub fn start<S: Scheduler<Handle = H>>(&mut self, scheduler: &mut S, period: Duration) -> H {
        self.stop(scheduler);
        let handle = scheduler.start_repeating(period);
        self.handle = Some(handle);
        handle
    }

    /// Cancel the live timer, if any.
    pub fn stop<S: Scheduler<Handle = H>>(&mut self, scheduler: &mut S) {
        if let Some(handle) = self.handle.take() {
            scheduler.cancel(handle);
        }
    }

    /// True if a timer is live.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// True if `handle` is the live timer.
    pub fn is_current(&self, handle: H) -> bool {
        self.handle == Some(handle)
    }

    /// Handle of the live timer.
    pub fn handle(&self) -> Option<H> {
        self.handle
    }
}
