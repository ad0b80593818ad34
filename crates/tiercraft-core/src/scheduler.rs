//! The tick-driven production scheduler.
//!
//! # Tick pipeline
//!
//! Every [`Scheduler::advance`] does at most one unit of work:
//! 1. **Halted** -- a fatal error was latched earlier; nothing happens.
//! 2. **Draining** -- pop one [`DispatchEntry`], provision its worker's input
//!    inventory and enqueue one batch.
//! 3. **Recounting** -- the queue is empty and the recount deadline passed:
//!    tally stock, pick a tier, and queue one entry per idle worker.
//! 4. **Idle** -- nothing due yet.
//!
//! Draining always wins over recounting, so a tick never does both.

use chrono::{DateTime, Utc};

use crate::catalog::RecipeCatalog;
use crate::config::SchedulerConfig;
use crate::dispatch::{DispatchEntry, DispatchQueue};
use crate::error::{SchedulerError, SetupError};
use crate::host::{Clock, Host, SystemClock};
use crate::id::{InventoryId, RecipeId, WorkerId};
use crate::ledger::Ledger;
use crate::provision::{ProvisionReport, Provisioner};
use crate::status::StatusReport;
use crate::tier::{TierDecision, TierPolicy};

// ---------------------------------------------------------------------------
// Phase and outcome
// ---------------------------------------------------------------------------

/// What the most recent `advance` did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Draining,
    Recounting,
    Halted,
}

/// Result of one [`Scheduler::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// One batch was provisioned and enqueued.
    Dispatched {
        worker: WorkerId,
        recipe: RecipeId,
        report: ProvisionReport,
    },
    /// Stock was recounted; `queued` entries were pushed.
    Recounted { decision: TierDecision, queued: usize },
    /// Nothing was due.
    Idle,
    /// The scheduler is halted, either by this tick or an earlier one.
    Halted,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Mutable scheduling state carried between ticks.
#[derive(Debug, Clone)]
pub struct ScheduleState {
    /// Recipe chosen at the last recount.
    pub current: RecipeId,
    /// Earliest time the next recount may run.
    pub next_recount: DateTime<Utc>,
    pub queue: DispatchQueue,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Scheduler<C: Clock = SystemClock> {
    config: SchedulerConfig,
    catalog: RecipeCatalog,
    policy: TierPolicy,
    ledger: Ledger,
    /// Workers in the order they are offered work.
    workers: Vec<WorkerId>,
    provisioner: Provisioner,
    state: ScheduleState,
    phase: Phase,
    halted: Option<SchedulerError>,
    status: StatusReport,
    last_decision: Option<TierDecision>,
    clock: C,
}

impl Scheduler<SystemClock> {
    /// A scheduler on the real clock.
    pub fn with_system_clock(
        config: SchedulerConfig,
        catalog: RecipeCatalog,
        policy: TierPolicy,
        inventories: Vec<InventoryId>,
        workers: Vec<WorkerId>,
    ) -> Result<Self, SetupError> {
        Self::new(config, catalog, policy, inventories, workers, SystemClock)
    }
}

impl<C: Clock> Scheduler<C> {
    /// Build a scheduler. The first `advance` recounts immediately.
    ///
    /// `inventories` is the ledger's source set in tie-break order: cargo
    /// containers and worker output inventories, never worker inputs. `workers` is the order in which
    /// idle workers are offered batches.
    pub fn new(
        config: SchedulerConfig,
        catalog: RecipeCatalog,
        policy: TierPolicy,
        inventories: Vec<InventoryId>,
        workers: Vec<WorkerId>,
        clock: C,
    ) -> Result<Self, SetupError> {
        config.validate()?;
        for tier in policy.tiers() {
            catalog.recipe_for(&tier.recipe)?;
        }

        let state = ScheduleState {
            current: policy.lowest().recipe.clone(),
            next_recount: clock.now(),
            queue: DispatchQueue::with_max_history(config.dispatch_history),
        };

        Ok(Self {
            provisioner: Provisioner::new(config.retry_limit),
            ledger: Ledger::new(inventories),
            config,
            catalog,
            policy,
            workers,
            state,
            phase: Phase::Idle,
            halted: None,
            status: StatusReport::new(),
            last_decision: None,
            clock,
        })
    }

    // -----------------------------------------------------------------------
    // Advance
    // -----------------------------------------------------------------------

    /// Run one tick against `host`.
    pub fn advance<H: Host + ?Sized>(&mut self, host: &mut H) -> TickOutcome {
        let now = self.clock.now();
        self.phase = self.next_phase(now);

        match self.phase {
            Phase::Halted => TickOutcome::Halted,
            Phase::Draining => self.drain_one(host, now),
            Phase::Recounting => self.recount(host, now),
            Phase::Idle => TickOutcome::Idle,
        }
    }

    fn next_phase(&self, now: DateTime<Utc>) -> Phase {
        if self.halted.is_some() {
            Phase::Halted
        } else if !self.state.queue.is_empty() {
            Phase::Draining
        } else if now >= self.state.next_recount {
            Phase::Recounting
        } else {
            Phase::Idle
        }
    }

    fn drain_one<H: Host + ?Sized>(&mut self, host: &mut H, now: DateTime<Utc>) -> TickOutcome {
        let Some(entry) = self.state.queue.pop() else {
            return TickOutcome::Idle;
        };

        match self.dispatch(host, &entry) {
            Ok(report) => {
                let name = host.worker_name(entry.worker);
                tracing::debug!(
                    worker = %name,
                    recipe = %entry.recipe,
                    transfers = report.transfers.len(),
                    "dispatched batch"
                );
                self.status.dispatched(&entry.recipe, &name);
                self.state.queue.record(now, entry.clone());
                TickOutcome::Dispatched {
                    worker: entry.worker,
                    recipe: entry.recipe,
                    report,
                }
            }
            Err(err) => self.halt(err),
        }
    }

    fn dispatch<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        entry: &DispatchEntry,
    ) -> Result<ProvisionReport, SchedulerError> {
        let recipe = self.catalog.recipe_for(&entry.recipe)?;
        let destination = host.input_inventory(entry.worker);
        let report = self.provisioner.provision(
            &mut self.ledger,
            host,
            recipe,
            self.config.batch_size,
            destination,
        )?;
        host.enqueue(entry.worker, &entry.recipe, self.config.batch_size);
        Ok(report)
    }

    fn recount<H: Host + ?Sized>(&mut self, host: &mut H, now: DateTime<Utc>) -> TickOutcome {
        let products = self.policy.tracked_products();
        let tally = self.ledger.tally(&*host, &products);
        let decision = self.policy.select(&tally);

        self.state.current = decision.recipe.clone();
        self.state.next_recount = now + self.config.recount_interval;

        let idle: Vec<WorkerId> = self
            .workers
            .iter()
            .copied()
            .filter(|&w| host.is_queue_empty(w))
            .collect();
        let queued = idle.len();
        self.state.queue.push_batch(idle.into_iter().map(|worker| DispatchEntry {
            worker,
            recipe: decision.recipe.clone(),
        }));

        tracing::info!(
            recipe = %decision.recipe,
            stock = ?decision.stock,
            queued,
            "recounted"
        );
        self.status.begin(now);
        self.status.decision(&decision);
        self.last_decision = Some(decision.clone());

        TickOutcome::Recounted { decision, queued }
    }

    fn halt(&mut self, err: SchedulerError) -> TickOutcome {
        tracing::error!(error = %err, "scheduler halted");
        self.status.halt(&err);
        self.halted = Some(err);
        self.phase = Phase::Halted;
        TickOutcome::Halted
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Human-readable status; just the error message once halted.
    pub fn status(&self) -> &StatusReport {
        &self.status
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// The error that halted the scheduler, if any.
    pub fn halted(&self) -> Option<&SchedulerError> {
        self.halted.as_ref()
    }

    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    pub fn last_decision(&self) -> Option<&TierDecision> {
        self.last_decision.as_ref()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn catalog(&self) -> &RecipeCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> &TierPolicy {
        &self.policy
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn workers(&self) -> &[WorkerId] {
        &self.workers
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
