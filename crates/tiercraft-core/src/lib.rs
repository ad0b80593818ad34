//! Tiercraft Core -- a tick-driven production scheduler for tiered crafting
//! chains.
//!
//! The scheduler keeps a pool of workers busy making the lowest tier of a
//! chain whose stock has fallen below its minimum, moving each batch's
//! ingredients into the worker's input inventory before the batch is queued.
//! It owns no items itself: everything goes through the host traits in
//! [`host`].
//!
//! # Tick Pipeline
//!
//! Each call to [`scheduler::Scheduler::advance`] does at most one of:
//!
//! 1. **Drain** -- pop one dispatch entry, provision, enqueue.
//! 2. **Recount** -- once the interval has elapsed, tally stock, select a tier
//!    and queue one entry per idle worker.
//!
//! A fatal error halts the scheduler for good; the status then reads as the
//! error message.
//!
//! # Key Types
//!
//! - [`scheduler::Scheduler`] -- phase machine and public entry point.
//! - [`catalog::RecipeCatalog`] -- immutable recipe table, built with
//!   [`catalog::RecipeCatalogBuilder`].
//! - [`ledger::Ledger`] -- registered source inventories plus the
//!   best-source cache.
//! - [`provision::Provisioner`] -- bounded-retry ingredient transfers.
//! - [`tier::TierPolicy`] -- threshold-based tier selection.
//! - [`memory::MemoryHost`] -- in-process host for tests and simulation.
//! - [`fixed::Quantity`] -- Q32.32 fixed-point quantities.

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod fixed;
pub mod host;
pub mod id;
pub mod ledger;
pub mod memory;
pub mod provision;
pub mod scheduler;
pub mod status;
pub mod tier;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
