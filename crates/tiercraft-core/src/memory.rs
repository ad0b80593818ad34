//! In-process reference host.
//!
//! [`MemoryHost`] keeps capacity-bounded inventories and assembler-like
//! workers in slot maps and implements [`InventoryHost`] and [`WorkerHost`]
//! over them. Every transfer request is logged so tests can assert on the
//! exact moves the scheduler issued.

use std::collections::VecDeque;

use slotmap::SlotMap;

use crate::catalog::RecipeCatalog;
use crate::fixed::{Quantity, clamped_sub, saturating_mul_64};
use crate::host::{InventoryHost, TransferOutcome, WorkerHost};
use crate::id::{InventoryId, ItemKind, RecipeId, WorkerId};

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// A stack of one item kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStack {
    pub kind: ItemKind,
    pub quantity: Quantity,
}

/// A named store of item stacks with optional total capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryInventory {
    pub name: String,
    stacks: Vec<ItemStack>,
    /// `None` means unbounded.
    capacity: Option<Quantity>,
}

impl MemoryInventory {
    pub fn new(name: impl Into<String>, capacity: Option<Quantity>) -> Self {
        Self {
            name: name.into(),
            stacks: Vec::new(),
            capacity,
        }
    }

    /// Add items. Returns the amount that didn't fit.
    #[must_use = "overflow indicates items that did not fit"]
    pub fn add(&mut self, kind: &ItemKind, quantity: Quantity) -> Quantity {
        let to_add = quantity.min(self.free_space());
        let overflow = quantity - to_add;

        if to_add > Quantity::ZERO {
            if let Some(stack) = self.stacks.iter_mut().find(|s| &s.kind == kind) {
                stack.quantity += to_add;
            } else {
                self.stacks.push(ItemStack {
                    kind: kind.clone(),
                    quantity: to_add,
                });
            }
        }

        overflow
    }

    /// Remove items. Returns the amount actually removed.
    #[must_use = "returns the quantity actually removed, which may be less than requested"]
    pub fn remove(&mut self, kind: &ItemKind, quantity: Quantity) -> Quantity {
        let Some(stack) = self.stacks.iter_mut().find(|s| &s.kind == kind) else {
            return Quantity::ZERO;
        };
        let to_remove = quantity.min(stack.quantity).max(Quantity::ZERO);
        stack.quantity -= to_remove;
        if stack.quantity <= Quantity::ZERO {
            self.stacks.retain(|s| s.quantity > Quantity::ZERO);
        }
        to_remove
    }

    pub fn quantity(&self, kind: &ItemKind) -> Quantity {
        self.stacks
            .iter()
            .find(|s| &s.kind == kind)
            .map(|s| s.quantity)
            .unwrap_or(Quantity::ZERO)
    }

    pub fn total(&self) -> Quantity {
        self.stacks
            .iter()
            .fold(Quantity::ZERO, |acc, s| acc.saturating_add(s.quantity))
    }

    pub fn free_space(&self) -> Quantity {
        match self.capacity {
            Some(cap) => clamped_sub(cap, self.total()),
            None => Quantity::MAX,
        }
    }

    pub fn stacks(&self) -> &[ItemStack] {
        &self.stacks
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// An assembler with its own input and output inventories and a FIFO queue.
#[derive(Debug, Clone)]
pub struct MemoryWorker {
    pub name: String,
    pub input: InventoryId,
    pub output: InventoryId,
    queue: VecDeque<(RecipeId, Quantity)>,
}

// ---------------------------------------------------------------------------
// Transfer log
// ---------------------------------------------------------------------------

/// One `try_move` call as the host saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub source: InventoryId,
    pub destination: InventoryId,
    pub item: ItemKind,
    pub requested: Quantity,
    pub moved: Quantity,
}

// ---------------------------------------------------------------------------
// MemoryHost
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    inventories: SlotMap<InventoryId, MemoryInventory>,
    workers: SlotMap<WorkerId, MemoryWorker>,
    transfers: Vec<TransferRecord>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_inventory(&mut self, name: impl Into<String>, capacity: Option<Quantity>) -> InventoryId {
        self.inventories.insert(MemoryInventory::new(name, capacity))
    }

    /// Add a worker together with its input and output inventories.
    pub fn add_worker(&mut self, name: impl Into<String>, capacity: Option<Quantity>) -> WorkerId {
        let name = name.into();
        let input = self.add_inventory(format!("{name} input"), capacity);
        let output = self.add_inventory(format!("{name} output"), capacity);
        self.workers.insert(MemoryWorker {
            name,
            input,
            output,
            queue: VecDeque::new(),
        })
    }

    pub fn inventory(&self, inventory: InventoryId) -> Option<&MemoryInventory> {
        self.inventories.get(inventory)
    }

    pub fn worker(&self, worker: WorkerId) -> Option<&MemoryWorker> {
        self.workers.get(worker)
    }

    /// Worker ids in insertion order.
    pub fn worker_ids(&self) -> Vec<WorkerId> {
        self.workers.keys().collect()
    }

    pub fn output_inventory(&self, worker: WorkerId) -> Option<InventoryId> {
        self.workers.get(worker).map(|w| w.output)
    }

    /// The ledger's source set for a station: `containers`, then the output
    /// inventory of each worker in `workers`. Input inventories are left out
    /// so provisioning never pulls back what it just delivered.
    pub fn ledger_sources(&self, containers: &[InventoryId], workers: &[WorkerId]) -> Vec<InventoryId> {
        containers
            .iter()
            .copied()
            .chain(workers.iter().filter_map(|&w| self.output_inventory(w)))
            .collect()
    }

    /// Put items straight into an inventory. Returns what didn't fit.
    pub fn deposit(&mut self, inventory: InventoryId, kind: &ItemKind, quantity: Quantity) -> Quantity {
        match self.inventories.get_mut(inventory) {
            Some(inv) => inv.add(kind, quantity),
            None => quantity,
        }
    }

    /// Take items straight out of an inventory. Returns what was removed.
    pub fn withdraw(&mut self, inventory: InventoryId, kind: &ItemKind, quantity: Quantity) -> Quantity {
        match self.inventories.get_mut(inventory) {
            Some(inv) => inv.remove(kind, quantity),
            None => Quantity::ZERO,
        }
    }

    pub fn quantity(&self, inventory: InventoryId, kind: &ItemKind) -> Quantity {
        self.inventories
            .get(inventory)
            .map(|inv| inv.quantity(kind))
            .unwrap_or(Quantity::ZERO)
    }

    pub fn transfers(&self) -> &[TransferRecord] {
        &self.transfers
    }

    pub fn clear_transfers(&mut self) {
        self.transfers.clear();
    }

    /// Pending batches of a worker, front first.
    pub fn queue(&self, worker: WorkerId) -> Vec<(RecipeId, Quantity)> {
        self.workers
            .get(worker)
            .map(|w| w.queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Complete the front batch of every worker whose input inventory holds
    /// all ingredients. Consumes the inputs and deposits the recipe product
    /// into the worker's output inventory. Returns the number of batches
    /// completed.
    pub fn fabricate(&mut self, catalog: &RecipeCatalog) -> usize {
        let mut completed = 0;
        let ids: Vec<WorkerId> = self.workers.keys().collect();

        for id in ids {
            let (input, output, recipe_id, batch) = {
                let worker = &self.workers[id];
                let Some((recipe_id, batch)) = worker.queue.front() else {
                    continue;
                };
                (worker.input, worker.output, recipe_id.clone(), *batch)
            };
            let Some(recipe) = catalog.get(&recipe_id) else {
                continue;
            };

            let needs: Vec<(ItemKind, Quantity)> = recipe
                .ingredients
                .iter()
                .map(|i| (i.item.clone(), saturating_mul_64(i.per_unit, batch)))
                .collect();
            let ready = needs
                .iter()
                .all(|(kind, amount)| self.quantity(input, kind) >= *amount);
            let room = self
                .inventories
                .get(output)
                .is_some_and(|inv| inv.free_space() >= batch);
            if !ready || !room {
                continue;
            }

            for (kind, amount) in &needs {
                let _ = self.withdraw(input, kind, *amount);
            }
            let _ = self.deposit(output, &recipe.product, batch);
            self.workers[id].queue.pop_front();
            completed += 1;
        }

        completed
    }
}

impl InventoryHost for MemoryHost {
    fn find_item(&self, inventory: InventoryId, kind: &ItemKind) -> Option<Quantity> {
        let held = self.inventories.get(inventory)?.quantity(kind);
        (held > Quantity::ZERO).then_some(held)
    }

    fn list_items(&self, inventory: InventoryId) -> Vec<(ItemKind, Quantity)> {
        self.inventories
            .get(inventory)
            .map(|inv| {
                inv.stacks
                    .iter()
                    .map(|s| (s.kind.clone(), s.quantity))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn try_move(
        &mut self,
        source: InventoryId,
        destination: InventoryId,
        kind: &ItemKind,
        amount: Quantity,
    ) -> TransferOutcome {
        let possible = match (self.inventories.get(source), self.inventories.get(destination)) {
            (Some(src), Some(dst)) if source != destination => {
                amount.min(src.quantity(kind)).min(dst.free_space())
            }
            _ => Quantity::ZERO,
        };

        let outcome = if possible > Quantity::ZERO {
            let removed = self.withdraw(source, kind, possible);
            let overflow = self.deposit(destination, kind, removed);
            TransferOutcome::moved(removed - overflow)
        } else {
            TransferOutcome::failed()
        };

        self.transfers.push(TransferRecord {
            source,
            destination,
            item: kind.clone(),
            requested: amount,
            moved: outcome.moved,
        });
        outcome
    }
}

impl WorkerHost for MemoryHost {
    fn is_queue_empty(&self, worker: WorkerId) -> bool {
        self.workers.get(worker).is_none_or(|w| w.queue.is_empty())
    }

    fn input_inventory(&self, worker: WorkerId) -> InventoryId {
        self.workers
            .get(worker)
            .map(|w| w.input)
            .unwrap_or_default()
    }

    fn enqueue(&mut self, worker: WorkerId, recipe: &RecipeId, batch_size: Quantity) {
        if let Some(w) = self.workers.get_mut(worker) {
            w.queue.push_back((recipe.clone(), batch_size));
        }
    }

    fn worker_name(&self, worker: WorkerId) -> String {
        self.workers
            .get(worker)
            .map(|w| w.name.clone())
            .unwrap_or_else(|| format!("{worker:?}"))
    }

    fn list_queue(&self, worker: WorkerId) -> Vec<(RecipeId, Quantity)> {
        self.queue(worker)
    }
}
