//! Capabilities the host environment provides to the scheduler.
//!
//! The scheduler never owns inventories or workers. It reads quantities,
//! requests transfers, and enqueues batches through these traits, which the
//! host implements over whatever it actually manages. [`MemoryHost`] is the
//! in-process reference implementation.
//!
//! [`MemoryHost`]: crate::memory::MemoryHost

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, TimeDelta, Utc};

use crate::fixed::Quantity;
use crate::id::{InventoryId, ItemKind, RecipeId, WorkerId};

/// Result of a single transfer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOutcome {
    pub success: bool,
    /// Amount that actually arrived at the destination.
    pub moved: Quantity,
}

impl TransferOutcome {
    pub fn moved(amount: Quantity) -> Self {
        Self {
            success: true,
            moved: amount,
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            moved: Quantity::ZERO,
        }
    }
}

/// Read and transfer access to the host's inventories.
pub trait InventoryHost {
    /// Quantity of `kind` held in `inventory`, or `None` if absent.
    fn find_item(&self, inventory: InventoryId, kind: &ItemKind) -> Option<Quantity>;

    /// Every stack held in `inventory`.
    fn list_items(&self, inventory: InventoryId) -> Vec<(ItemKind, Quantity)>;

    /// Attempt to move `amount` of `kind` from `source` to `destination`.
    fn try_move(
        &mut self,
        source: InventoryId,
        destination: InventoryId,
        kind: &ItemKind,
        amount: Quantity,
    ) -> TransferOutcome;
}

/// Queue access to the host's worker units.
pub trait WorkerHost {
    fn is_queue_empty(&self, worker: WorkerId) -> bool;

    /// The inventory a worker draws its ingredients from.
    fn input_inventory(&self, worker: WorkerId) -> InventoryId;

    fn enqueue(&mut self, worker: WorkerId, recipe: &RecipeId, batch_size: Quantity);

    /// Display name used in status lines.
    fn worker_name(&self, worker: WorkerId) -> String {
        format!("{worker:?}")
    }

    /// Pending batches, front first. Only used for status reporting.
    fn list_queue(&self, _worker: WorkerId) -> Vec<(RecipeId, Quantity)> {
        Vec::new()
    }
}

/// Everything the scheduler needs from a host.
pub trait Host: InventoryHost + WorkerHost {}

impl<T: InventoryHost + WorkerHost> Host for T {}

// ---------------------------------------------------------------------------
// Clocks
// ---------------------------------------------------------------------------

/// Wall-clock time source.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// The real UTC clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same time, so a
/// driver can keep a handle while the scheduler owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    /// A clock starting at the Unix epoch.
    pub fn at_epoch() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }

    pub fn advance(&self, by: TimeDelta) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::at_epoch();
        let handle = clock.clone();
        handle.advance(TimeDelta::seconds(90));
        assert_eq!(clock.now(), DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(90));

        let later = DateTime::<Utc>::UNIX_EPOCH + TimeDelta::hours(2);
        clock.set(later);
        assert_eq!(handle.now(), later);
    }

    #[test]
    fn transfer_outcome_constructors() {
        let ok = TransferOutcome::moved(Quantity::from_num(5));
        assert!(ok.success);
        assert_eq!(ok.moved, Quantity::from_num(5));

        let failed = TransferOutcome::failed();
        assert!(!failed.success);
        assert_eq!(failed.moved, Quantity::ZERO);
    }

    #[test]
    fn system_clock_moves_forward() {
        let a = SystemClock.now();
        let b = SystemClock.now();
        assert!(b >= a);
    }
}
