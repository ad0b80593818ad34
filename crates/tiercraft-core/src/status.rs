//! Human-readable status text.
//!
//! Rebuilt at every recount: a timestamp line, the tier decision, then one
//! line per completed dispatch. Once the scheduler halts the status is just
//! the error message.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::SchedulerError;
use crate::host::WorkerHost;
use crate::id::{RecipeId, WorkerId};
use crate::tier::TierDecision;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    lines: Vec<String>,
    halted: Option<String>,
}

impl StatusReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh report for a recount at `now`.
    pub fn begin(&mut self, now: DateTime<Utc>) {
        self.lines.clear();
        self.lines.push(now.format("%Y-%m-%d %H:%M:%S UTC").to_string());
    }

    pub fn decision(&mut self, decision: &TierDecision) {
        let line = match decision.stock {
            Some(stock) => format!("Making {}, current count: {stock}", decision.recipe),
            None => format!("Making {}", decision.recipe),
        };
        self.lines.push(line);
    }

    pub fn dispatched(&mut self, recipe: &RecipeId, worker_name: &str) {
        self.lines.push(format!("Making {recipe} in {worker_name}"));
    }

    pub fn halt(&mut self, error: &SchedulerError) {
        self.halted = Some(error.to_string());
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(message) = &self.halted {
            return writeln!(f, "{message}");
        }
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// One line per worker listing its pending batches, e.g.
/// `Assembler 1: tech2x x100, tech4x x100` or `Assembler 2: idle`.
pub fn queue_summary<H: WorkerHost + ?Sized>(host: &H, workers: &[WorkerId]) -> String {
    let mut out = String::new();
    for &worker in workers {
        let queue = host.list_queue(worker);
        let listing = if queue.is_empty() {
            "idle".to_string()
        } else {
            queue
                .iter()
                .map(|(recipe, amount)| format!("{recipe} x{amount}"))
                .collect::<Vec<_>>()
                .join(", ")
        };
        out.push_str(&format!("{}: {listing}\n", host.worker_name(worker)));
    }
    out
}
