//! Per-screen concurrency primitives.
//!
//! - [`ActionGate`] -- one in-flight permit per action; a second trigger
//!   while the first is running is refused, not queued.
//! - [`RequestSequence`] -- generation counter per logical query; only the
//!   most recently issued ticket may apply its result, and closing the
//!   owner cancels every outstanding one.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Semaphore, SemaphorePermit};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

// ---------------------------------------------------------------------------
// Action gate
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ActionGate {
    slot: Semaphore,
}

impl Default for ActionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionGate {
    pub fn new() -> Self {
        Self {
            slot: Semaphore::new(1),
        }
    }

    /// Claim the action. `None` while another permit is alive.
    pub fn try_acquire(&self) -> Option<ActionPermit<'_>> {
        self.slot.try_acquire().ok().map(|permit| ActionPermit { _permit: permit })
    }

    /// Whether the triggering control should render disabled.
    pub fn is_busy(&self) -> bool {
        self.slot.available_permits() == 0
    }
}

/// Releases its gate on drop, on success and failure alike.
#[derive(Debug)]
pub struct ActionPermit<'a> {
    _permit: SemaphorePermit<'a>,
}

// ---------------------------------------------------------------------------
// Request sequence
// ---------------------------------------------------------------------------

/// Tag of one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: AtomicU64,
    cancel: CancellationToken,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket, superseding every earlier one.
    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// A result may be applied only for the latest ticket of an open owner.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        !self.cancel.is_cancelled() && self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// The owner went away; every outstanding ticket is now stale.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_refused_while_busy() {
        let gate = ActionGate::new();
        let permit = gate.try_acquire();
        assert!(permit.is_some());
        assert!(gate.is_busy());
        assert!(gate.try_acquire().is_none());
        drop(permit);
        assert!(!gate.is_busy());
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn permit_released_on_early_return() {
        fn failing_action(gate: &ActionGate) -> Result<(), &'static str> {
            let _permit = gate.try_acquire().ok_or("busy")?;
            Err("upstream rejected")
        }
        let gate = ActionGate::new();
        assert_eq!(failing_action(&gate), Err("upstream rejected"));
        assert!(!gate.is_busy());
    }

    #[test]
    fn only_latest_ticket_is_current() {
        let seq = RequestSequence::new();
        let first = seq.issue();
        let second = seq.issue();
        assert!(second > first);
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
    }

    #[test]
    fn closing_invalidates_outstanding_tickets() {
        let seq = RequestSequence::new();
        let ticket = seq.issue();
        seq.close();
        assert!(seq.is_closed());
        assert!(!seq.is_current(ticket));
    }

    #[tokio::test]
    async fn close_wakes_a_pending_request() {
        let seq = RequestSequence::new();
        let outcome = tokio::select! {
            _ = seq.closed() => "closed",
            _ = async {
                seq.close();
                std::future::pending::<()>().await
            } => "finished",
        };
        assert_eq!(outcome, "closed");
    }
}
