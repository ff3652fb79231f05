use crate::sim::{HartState, SimHart};
use crate::stats;
use anyhow::{Result, bail};
use rayon::prelude::*;
use rvtrap_core::TrapStatistics;
use rvtrap_io::loader;
use rvtrap_io::parser::TraceLine;
use std::path::Path;

/// Replays `trace` on `harts` independent harts in parallel.
///
/// Every hart owns its own controller context; nothing is shared while the
/// trace runs.
pub fn replay(trace: &[TraceLine], harts: usize) -> Vec<SimHart> {
    (0..harts)
        .into_par_iter()
        .map(|id| {
            let mut hart = SimHart::new(id);
            hart.run(trace);
            hart
        })
        .collect()
}

/// Folds per-hart counters into one report.
pub fn aggregate(harts: &[SimHart]) -> TrapStatistics {
    harts.iter().fold(TrapStatistics::new(), |mut total, hart| {
        total.merge(&hart.stats());
        total
    })
}

pub fn run_replay(path: &Path, harts: usize) -> Result<()> {
    if harts == 0 {
        bail!("at least one hart is required");
    }

    println!("Loading trace from {}...", path.display());
    let trace = loader::load_trace_file(path)?;
    println!("Loaded {} events, replaying on {} hart(s).", trace.len(), harts);

    for line in &trace {
        if let Some(hart) = line.hart.filter(|&h| h >= harts) {
            println!("warning: line {} addresses hart {}, which is not simulated", line.line, hart);
        }
    }

    let results = replay(&trace, harts);
    for hart in &results {
        stats::print_hart(hart);
    }

    let halted = results
        .iter()
        .filter(|hart| matches!(hart.state(), HartState::Halted(_)))
        .count();
    stats::print_report("All harts", &aggregate(&results));
    println!("Halted: {}/{}", halted, results.len());

    Ok(())
}
