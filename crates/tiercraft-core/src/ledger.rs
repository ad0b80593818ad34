//! Read-only view over the managed inventories.
//!
//! The [`Ledger`] answers two questions: how much of an item exists across
//! every registered inventory, and which single inventory is the best place
//! to take it from. The second answer is memoized in a [`BestSourceCache`]
//! that callers invalidate once a source stops satisfying demand.

use std::collections::HashMap;

use crate::error::SchedulerError;
use crate::fixed::Quantity;
use crate::host::InventoryHost;
use crate::id::{InventoryId, ItemKind};

// ---------------------------------------------------------------------------
// BestSourceCache
// ---------------------------------------------------------------------------

/// Item kind -> the inventory last known to hold the most of it.
///
/// Entries are created lazily and evicted selectively; the cache lives as
/// long as the scheduler that owns it.
#[derive(Debug, Clone, Default)]
pub struct BestSourceCache {
    entries: HashMap<ItemKind, InventoryId>,
}

impl BestSourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: &ItemKind) -> Option<InventoryId> {
        self.entries.get(kind).copied()
    }

    pub fn insert(&mut self, kind: ItemKind, inventory: InventoryId) {
        self.entries.insert(kind, inventory);
    }

    /// Remove the entry for `kind`. Returns the inventory it pointed at.
    pub fn invalidate(&mut self, kind: &ItemKind) -> Option<InventoryId> {
        self.entries.remove(kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Stock tally
// ---------------------------------------------------------------------------

/// Totals for a set of item kinds, as counted at one recount.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockTally {
    counts: HashMap<ItemKind, Quantity>,
}

impl StockTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantity counted for `kind`; zero if it was not tracked or not found.
    pub fn get(&self, kind: &ItemKind) -> Quantity {
        self.counts.get(kind).copied().unwrap_or(Quantity::ZERO)
    }

    pub fn set(&mut self, kind: ItemKind, quantity: Quantity) {
        self.counts.insert(kind, quantity);
    }

    fn add(&mut self, kind: &ItemKind, quantity: Quantity) {
        if let Some(total) = self.counts.get_mut(kind) {
            *total = total.saturating_add(quantity);
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// The registered inventories plus the best-source cache.
#[derive(Debug, Clone)]
pub struct Ledger {
    /// Registration order; breaks best-source ties.
    inventories: Vec<InventoryId>,
    cache: BestSourceCache,
}

impl Ledger {
    pub fn new(inventories: Vec<InventoryId>) -> Self {
        Self {
            inventories,
            cache: BestSourceCache::new(),
        }
    }

    pub fn inventories(&self) -> &[InventoryId] {
        &self.inventories
    }

    pub fn cache(&self) -> &BestSourceCache {
        &self.cache
    }

    /// Sum of `kind` across every registered inventory.
    pub fn total_quantity<H: InventoryHost + ?Sized>(&self, host: &H, kind: &ItemKind) -> Quantity {
        self.inventories
            .iter()
            .filter_map(|&inv| host.find_item(inv, kind))
            .fold(Quantity::ZERO, |acc, q| acc.saturating_add(q))
    }

    /// Count several kinds in a single pass over every inventory's contents.
    ///
    /// This walks every stack of every inventory and is the most expensive
    /// call the scheduler makes; it runs once per recount.
    pub fn tally<H: InventoryHost + ?Sized>(&self, host: &H, kinds: &[ItemKind]) -> StockTally {
        let mut tally = StockTally::new();
        for kind in kinds {
            tally.set(kind.clone(), Quantity::ZERO);
        }
        for &inv in &self.inventories {
            for (kind, quantity) in host.list_items(inv) {
                tally.add(&kind, quantity);
            }
        }
        tally
    }

    /// The inventory holding the most of `kind`.
    ///
    /// Cache hits return without touching the host. On a miss every inventory
    /// is scanned; the strictly greatest positive holding wins and ties go to
    /// the earliest registered inventory.
    pub fn best_source<H: InventoryHost + ?Sized>(
        &mut self,
        host: &H,
        kind: &ItemKind,
    ) -> Result<InventoryId, SchedulerError> {
        if let Some(inv) = self.cache.get(kind) {
            return Ok(inv);
        }

        let mut best: Option<(InventoryId, Quantity)> = None;
        for &inv in &self.inventories {
            let Some(held) = host.find_item(inv, kind) else {
                continue;
            };
            if held <= Quantity::ZERO {
                continue;
            }
            if best.is_none_or(|(_, best_held)| held > best_held) {
                best = Some((inv, held));
            }
        }

        let (inv, held) = best.ok_or_else(|| SchedulerError::NoSourceAvailable(kind.clone()))?;
        tracing::trace!(item = %kind, ?inv, %held, "resolved best source");
        self.cache.insert(kind.clone(), inv);
        Ok(inv)
    }

    /// Forget the cached best source for `kind`.
    pub fn invalidate(&mut self, kind: &ItemKind) {
        if let Some(inv) = self.cache.invalidate(kind) {
            tracing::warn!(item = %kind, ?inv, "best source no longer satisfies demand");
        }
    }
}
