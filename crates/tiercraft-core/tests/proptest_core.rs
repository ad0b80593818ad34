//! Property-based tests for the scheduler core.
//!
//! Random stock layouts and tick sequences are generated with proptest, then
//! checked against the provisioning, selection, and dispatch invariants.

use chrono::TimeDelta;
use proptest::prelude::*;
use tiercraft_core::catalog::{Ingredient, Recipe};
use tiercraft_core::config::SchedulerConfig;
use tiercraft_core::fixed::Quantity;
use tiercraft_core::host::{ManualClock, WorkerHost};
use tiercraft_core::id::{InventoryId, RecipeId};
use tiercraft_core::ledger::{Ledger, StockTally};
use tiercraft_core::memory::MemoryHost;
use tiercraft_core::provision::Provisioner;
use tiercraft_core::scheduler::{Scheduler, TickOutcome};
use tiercraft_core::test_utils::*;

// ===========================================================================
// Generators
// ===========================================================================

fn two_ingredient_recipe(iron_per_unit: u16, silicon_per_unit: u16) -> Recipe {
    Recipe {
        id: RecipeId::new("plate"),
        product: tech2(),
        ingredients: vec![
            Ingredient::new(iron(), Quantity::from_num(iron_per_unit)),
            Ingredient::new(silicon(), Quantity::from_num(silicon_per_unit)),
        ],
    }
}

fn host_with_sources(
    iron_holdings: &[u16],
    silicon_holdings: &[u16],
) -> (MemoryHost, Vec<InventoryId>, InventoryId) {
    let mut host = MemoryHost::new();
    let count = iron_holdings.len().max(silicon_holdings.len());
    let sources: Vec<_> = (0..count)
        .map(|i| host.add_inventory(format!("Container {i}"), None))
        .collect();
    for (&inv, &amount) in sources.iter().zip(iron_holdings) {
        host.deposit(inv, &iron(), Quantity::from_num(amount));
    }
    for (&inv, &amount) in sources.iter().zip(silicon_holdings) {
        host.deposit(inv, &silicon(), Quantity::from_num(amount));
    }
    let dest = host.add_inventory("Assembler input", None);
    (host, sources, dest)
}

#[derive(Debug, Clone)]
enum TickOp {
    Advance,
    Wait(i64),
    Fabricate,
}

fn arb_tick_ops(max_ops: usize) -> impl Strategy<Value = Vec<TickOp>> {
    proptest::collection::vec(
        prop_oneof![
            4 => Just(TickOp::Advance),
            1 => (1..120i64).prop_map(TickOp::Wait),
            1 => Just(TickOp::Fabricate),
        ],
        1..=max_ops,
    )
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// With enough stock anywhere, provisioning tops the destination up to
    /// exactly `per_unit * batch` and moves nothing beyond the shortfall.
    #[test]
    fn provision_moves_exactly_the_shortfall(
        iron_holdings in proptest::collection::vec(0..400u16, 1..5),
        silicon_holdings in proptest::collection::vec(0..400u16, 1..5),
        iron_per_unit in 1..40u16,
        silicon_per_unit in 1..40u16,
        batch in 1..5u16,
        prestock in 0..100u16,
    ) {
        let iron_need = u32::from(iron_per_unit) * u32::from(batch);
        let silicon_need = u32::from(silicon_per_unit) * u32::from(batch);
        let iron_total: u32 = iron_holdings.iter().map(|&v| u32::from(v)).sum();
        let silicon_total: u32 = silicon_holdings.iter().map(|&v| u32::from(v)).sum();
        prop_assume!(iron_total + u32::from(prestock) >= iron_need);
        prop_assume!(silicon_total >= silicon_need);

        let (mut host, sources, dest) = host_with_sources(&iron_holdings, &silicon_holdings);
        host.deposit(dest, &iron(), Quantity::from_num(prestock));
        let mut ledger = Ledger::new(sources);
        let recipe = two_ingredient_recipe(iron_per_unit, silicon_per_unit);

        let report = Provisioner::default()
            .provision(&mut ledger, &mut host, &recipe, Quantity::from_num(batch), dest)
            .unwrap();

        let expected_iron = iron_need.saturating_sub(u32::from(prestock));
        prop_assert_eq!(report.moved(&iron()), Quantity::from_num(expected_iron));
        prop_assert_eq!(report.moved(&silicon()), Quantity::from_num(silicon_need));
        prop_assert_eq!(
            host.quantity(dest, &iron()),
            Quantity::from_num(iron_need.max(u32::from(prestock)))
        );
        prop_assert!(report.transfers.iter().all(|t| t.amount > Quantity::ZERO));
    }

    /// Raising stock never selects a lower tier.
    #[test]
    fn tier_selection_is_monotonic(
        low in (0..2000i32, 0..2000i32),
        bump in (0..2000i32, 0..2000i32),
        minimum in 1..1500i32,
    ) {
        let catalog = tech_catalog();
        let policy = tech_policy(&catalog, minimum);

        let mut before = StockTally::new();
        before.set(tech2(), qty(low.0));
        before.set(tech4(), qty(low.1));
        let mut after = StockTally::new();
        after.set(tech2(), qty(low.0 + bump.0));
        after.set(tech4(), qty(low.1 + bump.1));

        prop_assert!(policy.select(&before).index <= policy.select(&after).index);
    }

    /// A cached source is returned until invalidated; afterwards the largest
    /// holder is resolved again.
    #[test]
    fn best_source_is_stable_until_invalidated(
        holdings in proptest::collection::vec(1..1000u16, 1..6),
        drain in 0usize..6,
    ) {
        let (mut host, sources, _) = host_with_sources(&holdings, &[]);
        let mut ledger = Ledger::new(sources.clone());

        let first = ledger.best_source(&host, &iron()).unwrap();
        let drained = sources[drain % sources.len()];
        let _ = host.withdraw(drained, &iron(), Quantity::from_num(10_000));
        prop_assert_eq!(ledger.best_source(&host, &iron()).unwrap(), first);

        ledger.invalidate(&iron());
        match ledger.best_source(&host, &iron()) {
            Ok(source) => {
                let best = sources
                    .iter()
                    .map(|&inv| host.quantity(inv, &iron()))
                    .max()
                    .unwrap();
                prop_assert_eq!(host.quantity(source, &iron()), best);
                prop_assert!(best > Quantity::ZERO);
            }
            Err(_) => prop_assert_eq!(sources.len(), 1),
        }
    }

    /// No tick ever enqueues more than one batch, and transfers only happen
    /// on dispatch ticks.
    #[test]
    fn at_most_one_dispatch_per_advance(ops in arb_tick_ops(60), workers in 1..5usize) {
        let mut host = MemoryHost::new();
        let container = host.add_inventory("Container", None);
        for item in raw_ingots() {
            host.deposit(container, &item, qty(1_000_000));
        }
        let worker_ids: Vec<_> = (0..workers)
            .map(|i| host.add_worker(format!("Assembler {i}"), None))
            .collect();
        let clock = ManualClock::at_epoch();
        let catalog = tech_catalog();
        let policy = tech_policy(&catalog, 500);
        let config = SchedulerConfig { batch_size: qty(1), ..SchedulerConfig::default() };
        let mut scheduler = Scheduler::new(
            config,
            catalog.clone(),
            policy,
            vec![container],
            worker_ids.clone(),
            clock.clone(),
        )
        .unwrap();

        let queued = |host: &MemoryHost| -> usize {
            worker_ids.iter().map(|&w| host.list_queue(w).len()).sum()
        };

        for op in ops {
            match op {
                TickOp::Advance => {
                    let before = queued(&host);
                    host.clear_transfers();
                    let outcome = scheduler.advance(&mut host);
                    let after = queued(&host);
                    match outcome {
                        TickOutcome::Dispatched { .. } => prop_assert_eq!(after, before + 1),
                        _ => {
                            prop_assert_eq!(after, before);
                            prop_assert!(host.transfers().is_empty());
                        }
                    }
                    prop_assert!(!scheduler.is_halted());
                }
                TickOp::Wait(secs) => clock.advance(TimeDelta::seconds(secs)),
                TickOp::Fabricate => {
                    host.fabricate(&catalog);
                }
            }
        }
    }
}
