// Copyright 2025 the Parcelview Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Race gate for overlay rebuilds triggered by viewport changes.
//!
//! ## Protocol
//!
//! 1) On a trigger call [`RebuildGate::request`]. [`Admission::Run`] means no
//!    rebuild is in flight and the caller now owns one; [`Admission::Coalesced`]
//!    means one is already in flight and the trigger was folded into it.
//! 2) After each rebuild pass call [`RebuildGate::settle`]. It returns `true`
//!    exactly once per admitted rebuild, and only if triggers were coalesced
//!    during the first pass; the caller then runs one more pass and settles again.
//!
//! A burst of any length costs at most two passes. Triggers that arrive during
//! the extra pass are dropped; the next trigger after settling starts over.
//!
//! ```
//! use parcelview_stage::gate::{Admission, RebuildGate};
//!
//! let mut gate = RebuildGate::default();
//! assert_eq!(gate.request(), Admission::Run);
//! assert_eq!(gate.request(), Admission::Coalesced);
//! assert_eq!(gate.request(), Admission::Coalesced);
//! assert!(gate.settle());   // one extra pass for the coalesced triggers
//! assert!(!gate.settle());  // done
//! assert!(!gate.in_flight());
//! ```

/// Outcome of [`RebuildGate::request`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Run a rebuild now.
    Run,
    /// A rebuild is in flight; this trigger is folded into it.
    Coalesced,
}

/// In-flight and pending flags coalescing rebuild triggers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RebuildGate {
    in_flight: bool,
    pending: bool,
    extra_pass: bool,
}

impl RebuildGate {
    /// True while a rebuild is executing.
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// True if triggers were coalesced into the current rebuild.
    pub fn pending(&self) -> bool {
        self.pending
    }

    /// Admit or coalesce a trigger.
    pub fn request(&mut self) -> Admission {
        if self.in_flight {
            self.pending = true;
            Admission::Coalesced
        } else {
            self.in_flight = true;
            Admission::Run
        }
    }

    /// Report a finished pass. Returns `true` if exactly one more pass must run.
    pub fn settle(&mut self) -> bool {
        if self.in_flight && self.pending && !self.extra_pass {
            self.pending = false;
            self.extra_pass = true;
            return true;
        }
        self.reset();
        false
    }

    /// Return to idle, forgetting any pending trigger.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
