use std::collections::BTreeSet;
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result, bail, ensure};
use chrono::TimeDelta;
use clap::Parser;
use tiercraft_core::catalog::RecipeCatalog;
use tiercraft_core::fixed::Quantity;
use tiercraft_core::host::{Clock, ManualClock};
use tiercraft_core::id::{ItemKind, WorkerId};
use tiercraft_core::memory::MemoryHost;
use tiercraft_core::scheduler::{Scheduler, TickOutcome};
use tiercraft_core::status::queue_summary;
use tiercraft_data::{default_data_dir, load_production_data};

mod logging;

#[derive(Parser, Debug)]
#[command(name = "tiercraft-sim")]
#[command(about = "Run the tier scheduler against a simulated factory")]
struct Args {
    /// Directory holding recipes.* and schedule.* (default: bundled tech chain)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Number of assemblers
    #[arg(short, long, default_value = "4")]
    assemblers: usize,

    /// Number of cargo containers the scheduler draws from
    #[arg(short, long, default_value = "3")]
    containers: usize,

    /// Ticks to simulate
    #[arg(short, long, default_value = "600")]
    ticks: u64,

    /// Simulated seconds per tick
    #[arg(long, default_value = "1")]
    tick_seconds: i64,

    /// Complete queued batches every this many ticks (0 = never)
    #[arg(long, default_value = "10")]
    fabricate_every: u64,

    /// Starting amount of every raw ingredient, split across containers
    #[arg(long, default_value = "1000000")]
    stock: f64,

    /// Run on the wall clock, sleeping between ticks
    #[arg(long)]
    realtime: bool,
}

/// Items some recipe consumes but no recipe produces.
fn raw_ingredients(catalog: &RecipeCatalog) -> BTreeSet<ItemKind> {
    let products: BTreeSet<_> = catalog.recipes().map(|r| r.product.clone()).collect();
    catalog
        .recipes()
        .flat_map(|r| r.ingredients.iter().map(|i| i.item.clone()))
        .filter(|item| !products.contains(item))
        .collect()
}

/// Tick `scheduler` and the host's assemblers. Returns the number of batches
/// dispatched. `after_tick` moves time forward.
fn run<C: Clock>(
    scheduler: &mut Scheduler<C>,
    host: &mut MemoryHost,
    args: &Args,
    mut after_tick: impl FnMut(),
) -> usize {
    let catalog = scheduler.catalog().clone();
    let mut dispatched = 0usize;
    for n in 1..=args.ticks {
        match scheduler.advance(host) {
            TickOutcome::Dispatched { .. } => dispatched += 1,
            TickOutcome::Halted => break,
            TickOutcome::Recounted { .. } | TickOutcome::Idle => {}
        }
        if args.fabricate_every > 0 && n % args.fabricate_every == 0 {
            let completed = host.fabricate(&catalog);
            if completed > 0 {
                tracing::debug!(tick = n, completed, "batches completed");
            }
        }
        after_tick();
    }
    dispatched
}

fn report<C: Clock>(
    scheduler: &Scheduler<C>,
    host: &MemoryHost,
    workers: &[WorkerId],
    dispatched: usize,
) -> Result<()> {
    print!("{}", scheduler.status());
    println!();
    print!("{}", queue_summary(host, workers));
    println!();
    println!("Dispatched {dispatched} batches");
    for tier in scheduler.policy().tiers() {
        println!(
            "{}: {}",
            tier.product,
            scheduler.ledger().total_quantity(host, &tier.product)
        );
    }

    if let Some(err) = scheduler.halted() {
        bail!("scheduler halted: {err}");
    }
    Ok(())
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();
    ensure!(args.containers > 0, "need at least one container");
    ensure!(args.assemblers > 0, "need at least one assembler");
    ensure!(args.tick_seconds >= 0, "tick length must not be negative");

    let dir = args.data.clone().unwrap_or_else(default_data_dir);
    let data = load_production_data(&dir)
        .with_context(|| format!("loading production data from {}", dir.display()))?;

    let mut host = MemoryHost::new();
    let containers: Vec<_> = (0..args.containers)
        .map(|i| host.add_inventory(format!("Container {}", i + 1), None))
        .collect();
    let workers: Vec<_> = (0..args.assemblers)
        .map(|i| host.add_worker(format!("Assembler {}", i + 1), None))
        .collect();

    let per_container = Quantity::checked_from_num(args.stock / args.containers as f64)
        .with_context(|| format!("stock {} is out of range", args.stock))?;
    for item in raw_ingredients(&data.catalog) {
        for &container in &containers {
            let _ = host.deposit(container, &item, per_container);
        }
    }

    let sources = host.ledger_sources(&containers, &workers);
    let tick = TimeDelta::seconds(args.tick_seconds);

    if args.realtime {
        let mut scheduler = Scheduler::with_system_clock(
            data.config,
            data.catalog,
            data.policy,
            sources,
            workers.clone(),
        )?;
        let pause = tick.to_std().context("tick length out of range")?;
        let dispatched = run(&mut scheduler, &mut host, &args, || thread::sleep(pause));
        return report(&scheduler, &host, &workers, dispatched);
    }

    let clock = ManualClock::at_epoch();
    let mut scheduler = Scheduler::new(
        data.config,
        data.catalog,
        data.policy,
        sources,
        workers.clone(),
        clock.clone(),
    )?;
    let dispatched = run(&mut scheduler, &mut host, &args, || clock.advance(tick));
    report(&scheduler, &host, &workers, dispatched)
}
