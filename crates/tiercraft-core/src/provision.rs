//! Moves a recipe's ingredients into a worker's input inventory.
//!
//! Each ingredient is provisioned fully before the next one starts. Demand is
//! netted against what the destination already holds, and every shortfall
//! re-resolves the best source through the [`Ledger`]. Partial transfers are
//! never undone.

use crate::catalog::Recipe;
use crate::error::SchedulerError;
use crate::fixed::{Quantity, clamped_sub, saturating_mul_64};
use crate::host::InventoryHost;
use crate::id::{InventoryId, ItemKind};
use crate::ledger::Ledger;

/// Default number of resolve-and-transfer attempts per ingredient.
pub const DEFAULT_RETRY_LIMIT: u32 = 10;

/// A transfer that moved items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub item: ItemKind,
    pub source: InventoryId,
    pub amount: Quantity,
}

/// What one `provision` call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    /// Successful transfers, in the order they were issued.
    pub transfers: Vec<Transfer>,
    /// Attempts that left demand unmet and invalidated a cached source.
    pub invalidations: u32,
}

impl ProvisionReport {
    /// Total of `item` moved by this call.
    pub fn moved(&self, item: &ItemKind) -> Quantity {
        self.transfers
            .iter()
            .filter(|t| &t.item == item)
            .fold(Quantity::ZERO, |acc, t| acc + t.amount)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provisioner {
    retry_limit: u32,
}

impl Default for Provisioner {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_LIMIT)
    }
}

impl Provisioner {
    pub fn new(retry_limit: u32) -> Self {
        Self { retry_limit }
    }

    pub fn retry_limit(&self) -> u32 {
        self.retry_limit
    }

    /// Bring `destination` up to `per_unit * batch_size` of every ingredient
    /// of `recipe`.
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::NoSourceAvailable`] when no inventory holds an
    ///   ingredient still in demand.
    /// - [`SchedulerError::ProvisioningStalled`] when an ingredient needs more
    ///   than `retry_limit` attempts.
    ///
    /// Transfers completed before an error stay where they landed.
    pub fn provision<H: InventoryHost + ?Sized>(
        &self,
        ledger: &mut Ledger,
        host: &mut H,
        recipe: &Recipe,
        batch_size: Quantity,
        destination: InventoryId,
    ) -> Result<ProvisionReport, SchedulerError> {
        let mut report = ProvisionReport::default();
        for ingredient in &recipe.ingredients {
            let required = saturating_mul_64(ingredient.per_unit, batch_size);
            let held = host
                .find_item(destination, &ingredient.item)
                .unwrap_or(Quantity::ZERO);
            let remaining = clamped_sub(required, held);
            if remaining <= Quantity::ZERO {
                tracing::debug!(item = %ingredient.item, %required, %held, "already stocked");
                continue;
            }
            self.provision_item(ledger, host, &ingredient.item, remaining, destination, &mut report)?;
        }
        Ok(report)
    }

    fn provision_item<H: InventoryHost + ?Sized>(
        &self,
        ledger: &mut Ledger,
        host: &mut H,
        item: &ItemKind,
        mut remaining: Quantity,
        destination: InventoryId,
        report: &mut ProvisionReport,
    ) -> Result<(), SchedulerError> {
        let mut attempts = 0u32;
        while remaining > Quantity::ZERO {
            attempts += 1;
            if attempts > self.retry_limit {
                return Err(SchedulerError::ProvisioningStalled {
                    item: item.clone(),
                    attempts: self.retry_limit,
                });
            }

            let source = ledger.best_source(&*host, item)?;
            let held = host.find_item(source, item).unwrap_or(Quantity::ZERO);
            if held > Quantity::ZERO {
                let amount = remaining.min(held);
                let outcome = host.try_move(source, destination, item, amount);
                if outcome.success {
                    let moved = outcome.moved.min(amount).max(Quantity::ZERO);
                    remaining -= moved;
                    if moved > Quantity::ZERO {
                        tracing::debug!(item = %item, ?source, %moved, "transferred");
                        report.transfers.push(Transfer {
                            item: item.clone(),
                            source,
                            amount: moved,
                        });
                    }
                }
            }

            if remaining > Quantity::ZERO {
                ledger.invalidate(item);
                report.invalidations += 1;
            }
        }
        Ok(())
    }
}
