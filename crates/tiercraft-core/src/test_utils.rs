//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use std::collections::HashSet;

use crate::catalog::{Ingredient, RecipeCatalog, RecipeCatalogBuilder};
use crate::fixed::Quantity;
use crate::host::{InventoryHost, TransferOutcome, WorkerHost};
use crate::id::{InventoryId, ItemKind, RecipeId, WorkerId};
use crate::tier::{TierPolicy, TierSpec};

// ===========================================================================
// Quantity helper
// ===========================================================================

pub fn qty(v: i32) -> Quantity {
    Quantity::from_num(v)
}

// ===========================================================================
// Item kinds
// ===========================================================================

pub fn ingot(subtype: &str) -> ItemKind {
    ItemKind::new("ingot", subtype)
}

pub fn iron() -> ItemKind {
    ingot("iron")
}
pub fn silicon() -> ItemKind {
    ingot("silicon")
}
pub fn cobalt() -> ItemKind {
    ingot("cobalt")
}
pub fn silver() -> ItemKind {
    ingot("silver")
}
pub fn gold() -> ItemKind {
    ingot("gold")
}
pub fn uranium() -> ItemKind {
    ingot("uranium")
}
pub fn platinum() -> ItemKind {
    ingot("platinum")
}

pub fn tech2() -> ItemKind {
    ItemKind::new("component", "tech2x")
}
pub fn tech4() -> ItemKind {
    ItemKind::new("component", "tech4x")
}
pub fn tech8() -> ItemKind {
    ItemKind::new("component", "tech8x")
}

/// Every raw ingot the tech chain consumes.
pub fn raw_ingots() -> Vec<ItemKind> {
    vec![iron(), silicon(), cobalt(), silver(), gold(), uranium(), platinum()]
}

// ===========================================================================
// Catalog and policy fixtures
// ===========================================================================

fn line(item: ItemKind, per_unit: i32) -> Ingredient {
    Ingredient::new(item, qty(per_unit))
}

/// The three-tier tech chain: tech2x from ingots, tech4x from tech2x and
/// uranium, tech8x from tech4x and platinum.
pub fn tech_catalog() -> RecipeCatalog {
    let mut b = RecipeCatalogBuilder::new();
    b.register(
        "tech2x",
        tech2(),
        vec![
            line(iron(), 90),
            line(silicon(), 80),
            line(cobalt(), 32),
            line(silver(), 24),
            line(gold(), 16),
        ],
    );
    b.register("tech4x", tech4(), vec![line(tech2(), 5), line(uranium(), 10)]);
    b.register("tech8x", tech8(), vec![line(tech4(), 5), line(platinum(), 10)]);
    b.build().expect("tech catalog is valid")
}

/// tech2x -> tech4x -> tech8x, every non-top tier with the same minimum.
pub fn tech_policy(catalog: &RecipeCatalog, minimum: i32) -> TierPolicy {
    TierPolicy::new(
        vec![
            TierSpec::new("tech2x", qty(minimum)),
            TierSpec::new("tech4x", qty(minimum)),
            TierSpec::top("tech8x"),
        ],
        catalog,
    )
    .expect("tech policy is valid")
}

pub fn recipe(name: &str) -> RecipeId {
    RecipeId::new(name)
}

// ===========================================================================
// Fault injection
// ===========================================================================

/// Wraps a host and makes selected transfers fail without moving anything.
#[derive(Debug, Clone)]
pub struct FlakyHost<H> {
    pub inner: H,
    /// The next this-many transfers fail, whatever the item.
    pub fail_next: u32,
    /// Transfers of these kinds always fail.
    pub always_fail: HashSet<ItemKind>,
    /// Number of transfers that were failed on purpose.
    pub injected_failures: u32,
}

impl<H> FlakyHost<H> {
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            fail_next: 0,
            always_fail: HashSet::new(),
            injected_failures: 0,
        }
    }

    pub fn failing_next(mut self, count: u32) -> Self {
        self.fail_next = count;
        self
    }

    pub fn always_failing(mut self, kind: ItemKind) -> Self {
        self.always_fail.insert(kind);
        self
    }
}

impl<H: InventoryHost> InventoryHost for FlakyHost<H> {
    fn find_item(&self, inventory: InventoryId, kind: &ItemKind) -> Option<Quantity> {
        self.inner.find_item(inventory, kind)
    }

    fn list_items(&self, inventory: InventoryId) -> Vec<(ItemKind, Quantity)> {
        self.inner.list_items(inventory)
    }

    fn try_move(
        &mut self,
        source: InventoryId,
        destination: InventoryId,
        kind: &ItemKind,
        amount: Quantity,
    ) -> TransferOutcome {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            self.injected_failures += 1;
            return TransferOutcome::failed();
        }
        if self.always_fail.contains(kind) {
            self.injected_failures += 1;
            return TransferOutcome::failed();
        }
        self.inner.try_move(source, destination, kind, amount)
    }
}

impl<H: WorkerHost> WorkerHost for FlakyHost<H> {
    fn is_queue_empty(&self, worker: WorkerId) -> bool {
        self.inner.is_queue_empty(worker)
    }

    fn input_inventory(&self, worker: WorkerId) -> InventoryId {
        self.inner.input_inventory(worker)
    }

    fn enqueue(&mut self, worker: WorkerId, recipe: &RecipeId, batch_size: Quantity) {
        self.inner.enqueue(worker, recipe, batch_size)
    }

    fn worker_name(&self, worker: WorkerId) -> String {
        self.inner.worker_name(worker)
    }

    fn list_queue(&self, worker: WorkerId) -> Vec<(RecipeId, Quantity)> {
        self.inner.list_queue(worker)
    }
}
