//! Parallel restarts.
//!
//! Each worker runs the selected strategy from its own seed and starting
//! timetable inside a scoped thread and owns its candidate outright. The
//! only thing a worker shares is its final [`WorkerReport`], sent over a
//! channel. The coordinator keeps the best report by
//! [`Objective::rank`](crate::evaluation::Objective::rank); exact ties go to
//! the lower worker index, so the result does not depend on which thread
//! finishes first.

use std::sync::mpsc;
use std::thread;

use log::debug;

use super::search::{SearchContext, WorkerReport};
use super::{annealing, exact, genetic, lns, Strategy};
use crate::error::LeagueError;

/// Merged result of all workers.
#[derive(Debug)]
pub(crate) struct CoordinatorReport {
    pub best: WorkerReport,
    pub iterations: u64,
    pub nodes: u64,
    pub workers: usize,
}

/// Runs `workers` restarts of `strategy` and returns the best.
///
/// The first error reported by any worker (in worker order) is returned
/// instead.
pub(crate) fn run(
    ctx: &SearchContext<'_>,
    strategy: Strategy,
    workers: usize,
) -> Result<CoordinatorReport, LeagueError> {
    let workers = workers.max(1);
    let (tx, rx) = mpsc::channel();

    thread::scope(|scope| {
        for worker in 0..workers {
            let tx = tx.clone();
            scope.spawn(move || {
                let report = run_worker(ctx, strategy, worker);
                // The receiver outlives the scope
                let _ = tx.send((worker, report));
            });
        }
    });
    drop(tx);

    let mut reports: Vec<(usize, Result<WorkerReport, LeagueError>)> = rx.into_iter().collect();
    reports.sort_by_key(|(worker, _)| *worker);

    let mut best: Option<WorkerReport> = None;
    let (mut iterations, mut nodes) = (0u64, 0u64);
    let count = reports.len();
    for (worker, report) in reports {
        let report = report?;
        debug!(
            "worker {worker}: emissions {:.3}, time {:.3}, feasible {}",
            report.best.total_emissions(),
            report.best.total_time(),
            report.best.meets_target()
        );
        iterations += report.iterations;
        nodes += report.nodes;
        best = match best {
            Some(current) if !ctx.objective.is_better(&report.best, &current.best) => Some(current),
            _ => Some(report),
        };
    }

    let best = best.ok_or_else(|| LeagueError::InvalidConfig("no worker reported".into()))?;
    Ok(CoordinatorReport {
        best,
        iterations,
        nodes,
        workers: count,
    })
}

fn run_worker(
    ctx: &SearchContext<'_>,
    strategy: Strategy,
    worker: usize,
) -> Result<WorkerReport, LeagueError> {
    match strategy {
        Strategy::Exact => exact::run(ctx, worker),
        Strategy::Annealing | Strategy::Auto => annealing::run(ctx, worker, false),
        Strategy::Descent => annealing::run(ctx, worker, true),
        Strategy::Genetic => genetic::run(ctx, worker),
        Strategy::LargeNeighborhood => lns::run(ctx, worker),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{Evaluator, Objective};
    use crate::optimizer::{SolverConfig, Termination};
    use crate::params::{ParameterTable, TravelOption};
    use std::sync::atomic::AtomicBool;

    fn evaluator(target: f64) -> Evaluator {
        let table = ParameterTable::from_fn(6, |h, a| {
            let d = 2.0 + ((h * 3 + a * 5) % 9) as f64;
            TravelOption::new(25.0 * d, 6.0 * d, 1.0 * d, 3.5 * d)
        })
        .unwrap();
        let e0: f64 = table.iter().map(|(_, _, o)| o.emission_plane).sum();
        Evaluator::new(table, e0, target).unwrap()
    }

    fn coordinate(
        ev: &Evaluator,
        strategy: Strategy,
        workers: usize,
        seed: u64,
    ) -> CoordinatorReport {
        let config = SolverConfig::default().with_seed(seed).with_max_iterations(1_500);
        let flag = AtomicBool::new(false);
        let ctx = SearchContext {
            evaluator: ev,
            objective: Objective::MinTimeWithinBudget,
            config: &config,
            termination: Termination::new(None, config.max_iterations, &flag),
        };
        run(&ctx, strategy, workers).unwrap()
    }

    #[test]
    fn test_aggregates_all_workers() {
        let ev = evaluator(40.0);
        let report = coordinate(&ev, Strategy::Descent, 3, 5);
        assert_eq!(report.workers, 3);
        assert_eq!(report.iterations, 3 * 1_500);
        assert!(report.best.best.meets_target());
        assert!(report.best.best.schedule().validate().is_ok());
    }

    #[test]
    fn test_best_is_at_least_every_single_worker() {
        let ev = evaluator(40.0);
        let merged = coordinate(&ev, Strategy::Annealing, 3, 9);
        let config = SolverConfig::default().with_seed(9).with_max_iterations(1_500);
        let flag = AtomicBool::new(false);
        let ctx = SearchContext {
            evaluator: &ev,
            objective: Objective::MinTimeWithinBudget,
            config: &config,
            termination: Termination::new(None, config.max_iterations, &flag),
        };
        for worker in 0..3 {
            let single = annealing::run(&ctx, worker, false).unwrap();
            assert!(!Objective::MinTimeWithinBudget.is_better(&single.best, &merged.best.best));
        }
    }

    #[test]
    fn test_deterministic_across_runs() {
        let ev = evaluator(30.0);
        let a = coordinate(&ev, Strategy::Annealing, 4, 3);
        let b = coordinate(&ev, Strategy::Annealing, 4, 3);
        assert_eq!(a.best.worker, b.best.worker);
        assert_eq!(a.best.best, b.best.best);
    }

    #[test]
    fn test_zero_workers_runs_one() {
        let ev = evaluator(10.0);
        let report = coordinate(&ev, Strategy::Exact, 0, 1);
        assert_eq!(report.workers, 1);
        assert!(report.best.proven_optimal);
    }
}
