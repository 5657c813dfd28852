//! Solver entry point.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};

use super::search::SearchContext;
use super::{coordinator, SolverConfig, Termination};
use crate::error::LeagueError;
use crate::evaluation::Evaluator;
use crate::models::{Infeasibility, SearchStats, Solution, SolveOutcome, SolveReport};
use crate::params::ParameterTable;
use crate::transport::assign_unconstrained;
use crate::validation::Validator;

/// Finds a season timetable and transport modes for one league.
///
/// All input is checked in [`new`](Self::new); a constructed optimizer
/// only fails on internal defects.
///
/// # Examples
///
/// ```
/// use u_league::evaluation::{BaselineSource, Objective};
/// use u_league::models::{SolveStatus, TransportMode};
/// use u_league::optimizer::{Optimizer, SolverConfig};
/// use u_league::params::{ParameterTable, TravelOption};
///
/// let table = ParameterTable::from_fn(4, |h, a| {
///     let d = 1.0 + ((h + a) % 3) as f64;
///     TravelOption::new(60.0 * d, 15.0 * d, 1.5 * d, 4.0 * d)
/// })
/// .unwrap();
/// let config = SolverConfig::default()
///     .with_target(50.0)
///     .with_baseline(BaselineSource::Uniform(TransportMode::Plane))
///     .with_objective(Objective::MinTimeWithinBudget);
///
/// let report = Optimizer::new(table, config).unwrap().solve().unwrap();
/// assert_eq!(report.status(), SolveStatus::ProvenOptimal);
/// assert!(report.solution().meets_target());
/// ```
#[derive(Debug, Clone)]
pub struct Optimizer {
    evaluator: Evaluator,
    config: SolverConfig,
}

impl Optimizer {
    /// Checks the configuration and the table and resolves the baseline.
    pub fn new(table: ParameterTable, config: SolverConfig) -> Result<Self, LeagueError> {
        config.validate()?;
        let n = table.size();
        if n < 2 || n % 2 != 0 {
            return Err(LeagueError::InvalidTeamCount { count: n });
        }
        table.validate_for(n)?;
        let baseline = config.baseline.resolve(&table)?;
        let evaluator = Evaluator::new(table, baseline, config.target_reduction)?;
        Ok(Self { evaluator, config })
    }

    /// The evaluator, with the resolved baseline and budget.
    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// The configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Runs the configured search to completion.
    pub fn solve(&self) -> Result<SolveReport, LeagueError> {
        self.solve_with_interrupt(&AtomicBool::new(false))
    }

    /// Runs the configured search until it completes or `interrupt` is
    /// raised.
    ///
    /// Workers poll the flag between iterations, so the returned solution
    /// is always complete. A solution found this way is never reported as
    /// proven optimal unless the exact search had already closed.
    pub fn solve_with_interrupt(&self, interrupt: &AtomicBool) -> Result<SolveReport, LeagueError> {
        let evaluator = &self.evaluator;
        let config = &self.config;
        let n = evaluator.num_teams();
        let strategy = config.strategy.resolve(n, config.exact_team_limit);
        let workers = if strategy.is_exact() { 1 } else { config.workers };
        info!(
            "solving {n} teams with {strategy} ({workers} workers): \
             target {:.2}%, baseline {:.3}, objective {}",
            evaluator.target(),
            evaluator.baseline(),
            config.objective
        );

        let termination = Termination::new(config.time_limit(), config.max_iterations, interrupt);
        let ctx = SearchContext {
            evaluator,
            objective: config.objective,
            config,
            termination,
        };
        let merged = coordinator::run(&ctx, strategy, workers)?;
        let proven_optimal = merged.best.proven_optimal;
        let mut best = merged.best.best;

        // An over-budget result is beaten by the emission-minimal modes
        // whenever those meet the target
        if !best.meets_target() {
            let fallback = Solution::evaluate(
                evaluator,
                best.schedule().clone(),
                assign_unconstrained(evaluator.table()),
            )?;
            ctx.keep_best(&mut best, fallback);
        }
        Validator::new(evaluator).validate(&best)?;

        let outcome = if !evaluator.meets_target(evaluator.min_emissions()) {
            warn!(
                "target {:.2}% is infeasible: at least {:.3} emitted, budget {:.3}",
                evaluator.target(),
                best.total_emissions(),
                evaluator.budget()
            );
            SolveOutcome::Infeasible(Infeasibility {
                best_emissions: best.total_emissions(),
                required_emissions: evaluator.budget(),
                best,
            })
        } else if proven_optimal {
            SolveOutcome::Optimal(best)
        } else {
            SolveOutcome::BestFound(best)
        };

        let stats = SearchStats {
            iterations: merged.iterations,
            nodes: merged.nodes,
            workers: merged.workers,
            elapsed: termination.elapsed(),
            interrupted: interrupt.load(Ordering::Relaxed),
        };
        info!(
            "{}: emissions {:.3}, time {:.3}, reduction {:.2}% in {:?}",
            outcome.status(),
            outcome.solution().total_emissions(),
            outcome.solution().total_time(),
            outcome.solution().percent_reduction(),
            stats.elapsed
        );

        Ok(SolveReport {
            outcome,
            baseline: evaluator.baseline(),
            target: evaluator.target(),
            budget: evaluator.budget(),
            objective: config.objective,
            strategy,
            stats,
        })
    }
}
