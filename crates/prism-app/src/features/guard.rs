// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operation guards.
//
// `InFlight` admits one running invocation of an operation at a time and
// rejects the rest. `Epoch` tags asynchronous results with the session state
// they were started from, so results that arrive after the session moved on
// are dropped instead of applied.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use prism_core::error::{PrismError, Result};
use tracing::{debug, warn};

/// At-most-one-in-flight flag for one operation.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    busy: Arc<AtomicBool>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the operation. Fails with [`PrismError::Busy`] while another
    /// claim is alive; the claim is released when the ticket drops, whether
    /// the operation succeeded, failed or was abandoned.
    pub fn try_begin(&self, operation: &'static str) -> Result<InFlightTicket> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(operation, "rejected: already in flight");
            return Err(PrismError::Busy);
        }
        debug!(operation, "in flight");
        Ok(InFlightTicket {
            busy: Arc::clone(&self.busy),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof of a successful [`InFlight::try_begin`].
#[derive(Debug)]
pub struct InFlightTicket {
    busy: Arc<AtomicBool>,
}

impl Drop for InFlightTicket {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Generation counter for a session.
#[derive(Debug, Clone, Default)]
pub struct Epoch {
    current: Arc<AtomicU64>,
}

/// A value produced during one epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamped<T> {
    epoch: u64,
    value: T,
}

impl Epoch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to a new generation, invalidating everything stamped before.
    pub fn advance(&self) -> u64 {
        self.current.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    /// Tag `value` with the current generation.
    pub fn stamp<T>(&self, value: T) -> Stamped<T> {
        Stamped {
            epoch: self.current(),
            value,
        }
    }

    /// The value, if nothing has advanced the epoch since it was stamped.
    pub fn accept<T>(&self, stamped: Stamped<T>) -> Option<T> {
        let now = self.current();
        if stamped.epoch == now {
            Some(stamped.value)
        } else {
            warn!(stamped = stamped.epoch, current = now, "discarding stale result");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_is_rejected_until_release() {
        let guard = InFlight::new();
        let ticket = guard.try_begin("build").expect("first claim");
        assert!(guard.is_busy());
        assert!(matches!(guard.try_begin("build"), Err(PrismError::Busy)));

        drop(ticket);
        assert!(!guard.is_busy());
        guard.try_begin("build").expect("claim after release");
    }

    #[test]
    fn ticket_released_on_error_path() {
        let guard = InFlight::new();
        let attempt = || -> Result<()> {
            let _ticket = guard.try_begin("build")?;
            Err(PrismError::Serialize("boom".into()))
        };
        assert!(attempt().is_err());
        assert!(!guard.is_busy());
    }

    #[test]
    fn clones_share_the_flag() {
        let guard = InFlight::new();
        let other = guard.clone();
        let _ticket = guard.try_begin("save").expect("claim");
        assert!(other.is_busy());
    }

    #[test]
    fn stale_values_are_discarded() {
        let epoch = Epoch::new();
        let early = epoch.stamp("thumbnails for file A");
        epoch.advance();
        let late = epoch.stamp("thumbnails for file B");

        assert_eq!(epoch.accept(early), None);
        assert_eq!(epoch.accept(late), Some("thumbnails for file B"));
    }
}
