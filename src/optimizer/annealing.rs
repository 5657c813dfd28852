//! Simulated annealing and descent.
//!
//! A move either changes the timetable ([`Schedule::swap_weeks`],
//! [`Schedule::swap_home_away`]) or the modes (one flip, or two flips at
//! once so that a dirtier trip can be paid for by a cleaner one under a
//! tight budget). Every move is an involution, so a rejected move is
//! undone by applying it again.
//!
//! Candidates are compared through a scalar energy. A move that
//! would take a feasible candidate over the emission budget is always
//! rejected. Worse moves are accepted with the Metropolis probability
//! `exp(-Δ/T)`; descent is the same loop at zero temperature. Once the
//! temperature is frozen, annealing reheats and restarts from its best
//! solution.
//!
//! Totals are updated incrementally and re-derived from scratch whenever a
//! new best is stored and every `RESYNC_INTERVAL` iterations.

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::Rng;

use super::search::{Scalarizer, SearchContext, WorkerReport};
use crate::error::LeagueError;
use crate::models::Solution;
use crate::params::ParameterTable;
use crate::schedule::Schedule;

/// Iterations between two full re-evaluations of the current candidate.
const RESYNC_INTERVAL: u64 = 4096;

/// Geometric cooling: `T ← α·T`, frozen at or below `min_temp`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GeometricCooling {
    initial: f64,
    current: f64,
    alpha: f64,
    min_temp: f64,
}

impl GeometricCooling {
    fn new(initial: f64, alpha: f64, min_temp: f64) -> Self {
        Self {
            initial,
            current: initial,
            alpha,
            min_temp,
        }
    }

    fn reheat(&mut self) {
        self.current = self.initial;
    }

    fn update(&mut self) {
        self.current *= self.alpha;
    }

    fn is_frozen(&self) -> bool {
        self.current <= self.min_temp
    }
}

/// A reversible change to a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    SwapWeeks(usize, usize),
    SwapHomeAway(usize, usize),
    Flip((usize, usize)),
    Exchange((usize, usize), (usize, usize)),
}

impl Move {
    fn random(rng: &mut StdRng, num_teams: usize, num_weeks: usize, structural_rate: f64) -> Self {
        if rng.random_bool(structural_rate) {
            if num_weeks >= 2 && rng.random_bool(0.5) {
                let (w1, w2) = distinct(rng, num_weeks);
                Move::SwapWeeks(w1, w2)
            } else {
                let (i, j) = distinct(rng, num_teams);
                Move::SwapHomeAway(i, j)
            }
        } else if rng.random_bool(0.5) {
            Move::Flip(distinct(rng, num_teams))
        } else {
            Move::Exchange(distinct(rng, num_teams), distinct(rng, num_teams))
        }
    }

    fn is_structural(self) -> bool {
        matches!(self, Move::SwapWeeks(..) | Move::SwapHomeAway(..))
    }

    /// Applies the move and returns the change in (emissions, time).
    fn apply(self, solution: &mut Solution, table: &ParameterTable) -> (f64, f64) {
        match self {
            Move::SwapWeeks(w1, w2) => {
                solution.schedule.swap_weeks(w1, w2);
                (0.0, 0.0)
            }
            Move::SwapHomeAway(i, j) => {
                solution.schedule.swap_home_away(i, j);
                (0.0, 0.0)
            }
            Move::Flip(pair) => flip(solution, table, pair),
            Move::Exchange(p1, p2) => {
                let (e1, t1) = flip(solution, table, p1);
                let (e2, t2) = flip(solution, table, p2);
                (e1 + e2, t1 + t2)
            }
        }
    }
}

fn flip(
    solution: &mut Solution,
    table: &ParameterTable,
    (home, away): (usize, usize),
) -> (f64, f64) {
    let Some(old) = solution.assignment.mode(home, away) else {
        return (0.0, 0.0);
    };
    let new = old.other();
    solution.assignment.set(home, away, new);
    let option = table.option(home, away);
    (
        option.emission(new) - option.emission(old),
        option.time(new) - option.time(old),
    )
}

/// Two different indices below `n` (`n ≥ 2`).
fn distinct(rng: &mut StdRng, n: usize) -> (usize, usize) {
    let a = rng.random_range(0..n);
    let mut b = rng.random_range(0..n - 1);
    if b >= a {
        b += 1;
    }
    (a, b)
}

/// Runs annealing, or descent when `descent` is set.
pub(crate) fn run(
    ctx: &SearchContext<'_>,
    worker: usize,
    descent: bool,
) -> Result<WorkerReport, LeagueError> {
    let evaluator = ctx.evaluator;
    let table = evaluator.table();
    let config = ctx.config;
    let mut rng = ctx.rng(worker);

    let mut current = ctx.initial_solution(worker, &mut rng)?;
    let mut best = current.clone();
    let scalar = Scalarizer::new(evaluator, ctx.objective);
    let mut cooling = GeometricCooling::new(
        config.initial_temperature,
        config.cooling_rate,
        config.min_temperature,
    );
    let n = evaluator.num_teams();
    let weeks = Schedule::expected_weeks(n);

    let mut iterations = 0u64;
    while !ctx.termination.should_stop(iterations) {
        iterations += 1;
        let mv = Move::random(&mut rng, n, weeks, config.structural_move_rate);

        let (e0, t0, b0) = (current.total_emissions(), current.total_time(), current.breaks);
        let (de, dt) = mv.apply(&mut current, table);
        let (e1, t1) = (e0 + de, t0 + dt);
        let b1 = if mv.is_structural() {
            current.schedule.breaks()
        } else {
            b0
        };

        let leaves_budget = current.meets_target() && !evaluator.meets_target(e1);
        let delta = scalar.energy(e1, t1, b1) - scalar.energy(e0, t0, b0);
        let accept = !leaves_budget
            && (delta <= 0.0
                || (!descent
                    && !cooling.is_frozen()
                    && rng.random::<f64>() < (-delta / cooling.current).exp()));

        if accept {
            current.evaluation = evaluator.from_totals(e1, t1);
            current.breaks = b1;
            if ctx.objective.is_better(&current, &best) {
                let exact = Solution::evaluate(
                    evaluator,
                    current.schedule.clone(),
                    current.assignment.clone(),
                )?;
                current.evaluation = exact.evaluation;
                if ctx.keep_best(&mut best, exact) {
                    trace!(
                        "worker {worker}: iteration {iterations}, best emissions {:.3}, time {:.3}",
                        best.total_emissions(),
                        best.total_time()
                    );
                }
            }
        } else {
            mv.apply(&mut current, table);
        }

        if iterations % RESYNC_INTERVAL == 0 {
            current.evaluation = evaluator.evaluate(&current.schedule, &current.assignment)?;
        }
        if !descent {
            cooling.update();
            if cooling.is_frozen() {
                cooling.reheat();
                current = best.clone();
            }
        }
    }

    debug!(
        "worker {worker}: {} finished after {iterations} iterations, emissions {:.3}",
        if descent { "descent" } else { "annealing" },
        best.total_emissions()
    );
    Ok(WorkerReport {
        worker,
        best,
        iterations,
        nodes: 0,
        proven_optimal: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{Evaluator, Objective};
    use crate::optimizer::{SolverConfig, Termination};
    use crate::params::TravelOption;
    use rand::SeedableRng;
    use std::sync::atomic::AtomicBool;

    fn evaluator(target: f64) -> Evaluator {
        let table = ParameterTable::from_fn(6, |h, a| {
            let d = 1.0 + ((h * 5 + a * 3) % 7) as f64;
            TravelOption::new(30.0 * d, 8.0 * d, 1.0 * d, 4.0 * d)
        })
        .unwrap();
        let e0: f64 = table.iter().map(|(_, _, o)| o.emission_plane).sum();
        Evaluator::new(table, e0, target).unwrap()
    }

    fn run_with(
        ev: &Evaluator,
        objective: Objective,
        descent: bool,
        iterations: u64,
    ) -> WorkerReport {
        let config = SolverConfig::default().with_seed(7);
        let flag = AtomicBool::new(false);
        let ctx = SearchContext {
            evaluator: ev,
            objective,
            config: &config,
            termination: Termination::new(None, iterations, &flag),
        };
        run(&ctx, 1, descent).unwrap()
    }

    #[test]
    fn test_moves_are_involutions() {
        let ev = evaluator(10.0);
        let mut rng = StdRng::seed_from_u64(3);
        let start = Solution::evaluate(
            &ev,
            Schedule::build_initial(6).unwrap(),
            crate::transport::assign_unconstrained(ev.table()),
        )
        .unwrap();
        for _ in 0..200 {
            let mut sol = start.clone();
            let mv = Move::random(&mut rng, 6, 10, 0.5);
            let (de, dt) = mv.apply(&mut sol, ev.table());
            let (ue, ut) = mv.apply(&mut sol, ev.table());
            assert_eq!(sol.schedule(), start.schedule(), "{mv:?}");
            assert_eq!(sol.assignment(), start.assignment(), "{mv:?}");
            assert!((de + ue).abs() < 1e-9 && (dt + ut).abs() < 1e-9);
        }
    }

    #[test]
    fn test_annealing_keeps_emission_optimum() {
        let ev = evaluator(50.0);
        let report = run_with(&ev, Objective::MinEmissions, false, 3_000);
        assert!(report.best.schedule().validate().is_ok());
        assert!((report.best.total_emissions() - ev.min_emissions()).abs() < 1e-9);
        assert_eq!(report.iterations, 3_000);
    }

    #[test]
    fn test_descent_stays_within_budget() {
        let ev = evaluator(60.0);
        let report = run_with(&ev, Objective::MinTimeWithinBudget, true, 3_000);
        assert!(report.best.meets_target());
        let start = crate::transport::assign_within_budget(ev.table(), ev.budget()).unwrap();
        let (_, greedy_time) = start.totals(ev.table()).unwrap();
        assert!(report.best.total_time() <= greedy_time + 1e-9);
    }

    #[test]
    fn test_annealing_never_worsens_start() {
        let ev = evaluator(0.0);
        let config = SolverConfig::default().with_seed(11);
        let flag = AtomicBool::new(false);
        let ctx = SearchContext {
            evaluator: &ev,
            objective: Objective::MinEmissions,
            config: &config,
            termination: Termination::new(None, 4_000, &flag),
        };
        let mut rng = ctx.rng(2);
        let start = ctx.initial_solution(2, &mut rng).unwrap();
        let report = run(&ctx, 2, false).unwrap();
        // Modes start optimal, so only the timetable tie-break can improve
        assert_eq!(report.best.total_emissions(), start.total_emissions());
        assert!(report.best.breaks() <= start.breaks());
        assert_eq!(report.best.breaks(), report.best.schedule().breaks());
    }

    #[test]
    fn test_interrupt_returns_start() {
        let ev = evaluator(10.0);
        let config = SolverConfig::default();
        let flag = AtomicBool::new(true);
        let ctx = SearchContext {
            evaluator: &ev,
            objective: Objective::MinEmissions,
            config: &config,
            termination: Termination::new(None, u64::MAX, &flag),
        };
        let report = run(&ctx, 0, false).unwrap();
        assert_eq!(report.iterations, 0);
        assert!(report.best.schedule().validate().is_ok());
    }
}
