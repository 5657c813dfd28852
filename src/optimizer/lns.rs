//! Large-neighbourhood strategy.
//!
//! Implements the [`AlnsProblem`](u_metaheur::alns::AlnsProblem) trait over
//! a season state. Destroy operators clear the modes of a share of the
//! trips (and may move weeks); repair operators reassign them.
//!
//! # Operators
//!
//! - `Random` destroy: clears random trips
//! - `Costliest` destroy: clears the trips contributing most to the
//!   primary objective
//! - `Team` destroy: clears every trip of one team and moves its venues
//!   and one of its weeks
//! - `Greedy` repair: preferred modes, then upgrades by ratio while the
//!   budget allows
//! - `Randomized` repair: random modes, then reverts upgrades until the
//!   budget holds
//!
//! The runner is restarted in epochs from the incumbent. Each epoch is
//! capped by the iterations left, and destroy degrees are drawn from
//! `[destroy_degree / 2, destroy_degree]`. An interrupt or an expired
//! deadline cancels the runner at the next iteration.
//!
//! # Reference
//!
//! Ropke, S. & Pisinger, D. (2006). "An Adaptive Large Neighborhood Search
//! Heuristic for the Pickup and Delivery Problem with Time Windows",
//! *Transportation Science* 40(4), 455-472.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, trace};
use rand::Rng;
use u_metaheur::alns::{AlnsConfig, AlnsProblem, AlnsRunner, DestroyOperator, RepairOperator};

use super::config::SolverConfig;
use super::search::{Scalarizer, SearchContext, WorkerReport};
use super::termination::Termination;
use crate::error::LeagueError;
use crate::evaluation::{Evaluator, Objective};
use crate::models::{Solution, TransportMode};
use crate::params::ParameterTable;
use crate::schedule::Schedule;
use crate::transport::{
    complete_with_preferred, preferred_mode, repair_to_budget, upgrade_greedily, Assignment,
};

/// Probability that randomized repair picks the non-preferred mode.
const RANDOM_ALTERNATIVE_RATE: f64 = 0.3;

/// Timetable and modes with cached totals.
#[derive(Debug, Clone)]
pub(crate) struct SeasonState {
    schedule: Schedule,
    assignment: Assignment,
    emissions: f64,
    time: f64,
}

impl SeasonState {
    fn from_solution(solution: &Solution) -> Self {
        Self {
            schedule: solution.schedule.clone(),
            assignment: solution.assignment.clone(),
            emissions: solution.total_emissions(),
            time: solution.total_time(),
        }
    }

    /// Recomputes the totals; an incomplete assignment gets infinite totals.
    fn refresh(&mut self, table: &ParameterTable) {
        let (e, t) = self
            .assignment
            .totals(table)
            .unwrap_or((f64::INFINITY, f64::INFINITY));
        self.emissions = e;
        self.time = t;
    }
}

/// ALNS problem for one epoch.
pub(crate) struct SeasonAlnsProblem<'a> {
    evaluator: Evaluator,
    scalar: Scalarizer,
    incumbent: SeasonState,
    termination: Option<Termination<'a>>,
    cancel: Arc<AtomicBool>,
}

impl<'a> SeasonAlnsProblem<'a> {
    pub fn new(evaluator: Evaluator, incumbent: &Solution, objective: Objective) -> Self {
        let scalar = Scalarizer::new(&evaluator, objective);
        Self {
            evaluator,
            scalar,
            incumbent: SeasonState::from_solution(incumbent),
            termination: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Raises the cancel flag once `termination` is interrupted or out of time.
    pub fn with_termination(mut self, termination: Termination<'a>) -> Self {
        self.termination = Some(termination);
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }
}

impl AlnsProblem for SeasonAlnsProblem<'_> {
    type Solution = SeasonState;

    fn initial_solution<R: Rng>(&self, _rng: &mut R) -> SeasonState {
        self.incumbent.clone()
    }

    fn cost(&self, state: &SeasonState) -> f64 {
        if self.termination.is_some_and(|t| t.is_halted()) {
            self.cancel.store(true, Ordering::Relaxed);
        }
        if !state.emissions.is_finite() {
            return f64::INFINITY;
        }
        let eval = self.evaluator.from_totals(state.emissions, state.time);
        self.scalar.fitness(&self.evaluator, &eval, state.schedule.breaks())
    }
}

/// Destroy operators.
#[derive(Debug, Clone)]
pub(crate) enum LeagueDestroy {
    Random,
    Costliest { table: ParameterTable, objective: Objective },
    Team,
}

impl DestroyOperator<SeasonState> for LeagueDestroy {
    fn name(&self) -> &str {
        match self {
            LeagueDestroy::Random => "random_trips",
            LeagueDestroy::Costliest { .. } => "costliest_trips",
            LeagueDestroy::Team => "team_trips",
        }
    }

    fn destroy<R: Rng>(&self, state: &SeasonState, degree: f64, rng: &mut R) -> SeasonState {
        let mut s = state.clone();
        let n = s.assignment.num_teams();
        if n < 2 {
            return s;
        }
        let trips = n * (n - 1);
        let count = ((trips as f64 * degree).round() as usize).clamp(1, trips);
        match self {
            LeagueDestroy::Random => {
                for _ in 0..count {
                    let home = rng.random_range(0..n);
                    let mut away = rng.random_range(0..n - 1);
                    if away >= home {
                        away += 1;
                    }
                    s.assignment.clear(home, away);
                }
            }
            LeagueDestroy::Costliest { table, objective } => {
                let mut scored: Vec<(f64, usize, usize)> = s
                    .assignment
                    .pairs()
                    .filter_map(|(h, a, m)| {
                        let option = table.get(h, a)?;
                        let mode = m?;
                        let cost = match objective {
                            Objective::MinEmissions => option.emission(mode),
                            Objective::MinTimeWithinBudget => option.time(mode),
                        };
                        Some((cost, h, a))
                    })
                    .collect();
                scored.sort_by(|x, y| {
                    y.0.total_cmp(&x.0)
                        .then_with(|| (x.1, x.2).cmp(&(y.1, y.2)))
                });
                for &(_, h, a) in scored.iter().take(count) {
                    s.assignment.clear(h, a);
                }
            }
            LeagueDestroy::Team => {
                let team = rng.random_range(0..n);
                for other in (0..n).filter(|&o| o != team) {
                    s.assignment.clear(team, other);
                    s.assignment.clear(other, team);
                    if rng.random_bool(0.5) {
                        s.schedule.swap_home_away(team, other);
                    }
                }
                let weeks = s.schedule.num_weeks();
                if weeks >= 2 {
                    let w1 = rng.random_range(0..weeks);
                    let w2 = rng.random_range(0..weeks);
                    s.schedule.swap_weeks(w1, w2);
                }
            }
        }
        s
    }
}

/// Repair operators.
#[derive(Debug, Clone)]
pub(crate) struct LeagueRepair {
    kind: RepairKind,
    table: ParameterTable,
    budget: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RepairKind {
    Greedy,
    Randomized,
}

impl LeagueRepair {
    pub fn new(kind: RepairKind, table: ParameterTable, budget: f64) -> Self {
        Self { kind, table, budget }
    }
}

impl RepairOperator<SeasonState> for LeagueRepair {
    fn name(&self) -> &str {
        match self.kind {
            RepairKind::Greedy => "greedy_modes",
            RepairKind::Randomized => "randomized_modes",
        }
    }

    fn repair<R: Rng>(&self, state: &SeasonState, rng: &mut R) -> SeasonState {
        let mut s = state.clone();
        match self.kind {
            RepairKind::Greedy => {
                let filled = complete_with_preferred(&self.table, &mut s.assignment);
                s.refresh(&self.table);
                if s.emissions.is_finite() {
                    let (table, budget) = (&self.table, self.budget);
                    upgrade_greedily(table, &mut s.assignment, &filled, budget, s.emissions);
                    s.refresh(&self.table);
                }
            }
            RepairKind::Randomized => {
                for (home, away) in s.assignment.missing() {
                    let preferred = preferred_mode(self.table.option(home, away));
                    let mode: TransportMode = if rng.random_bool(RANDOM_ALTERNATIVE_RATE) {
                        preferred.other()
                    } else {
                        preferred
                    };
                    s.assignment.set(home, away, mode);
                }
                s.refresh(&self.table);
                // Over budget only if even the emission-minimal modes are
                repair_to_budget(&self.table, &mut s.assignment, self.budget, s.emissions);
                s.refresh(&self.table);
            }
        }
        s
    }
}

/// Runner configuration for an epoch of `iterations` iterations.
pub(crate) fn epoch_config(config: &SolverConfig, iterations: u64, seed: u64) -> AlnsConfig {
    AlnsConfig::default()
        .with_max_iterations(usize::try_from(iterations).unwrap_or(usize::MAX))
        .with_destroy_degree(config.destroy_degree / 2.0, config.destroy_degree)
        .with_seed(seed)
}

/// Runs the large-neighbourhood strategy as one worker.
pub(crate) fn run(ctx: &SearchContext<'_>, worker: usize) -> Result<WorkerReport, LeagueError> {
    let evaluator = ctx.evaluator;
    let config = ctx.config;
    let table = evaluator.table();
    let mut rng = ctx.rng(worker);
    let mut best = ctx.initial_solution(worker, &mut rng)?;

    let destroy_ops = vec![
        LeagueDestroy::Random,
        LeagueDestroy::Costliest {
            table: table.clone(),
            objective: ctx.objective,
        },
        LeagueDestroy::Team,
    ];
    let repair_ops = vec![
        LeagueRepair::new(RepairKind::Greedy, table.clone(), evaluator.budget()),
        LeagueRepair::new(RepairKind::Randomized, table.clone(), evaluator.budget()),
    ];

    let termination = ctx.termination;
    let mut iterations = 0u64;
    let mut epoch = 0u64;
    while !termination.should_stop(iterations) {
        let epoch_len = termination.next_chunk(iterations, config.iterations_per_epoch as u64);
        let problem = SeasonAlnsProblem::new(evaluator.clone(), &best, ctx.objective)
            .with_termination(termination);
        let alns_config = epoch_config(config, epoch_len, rng.random::<u64>());
        let cancel = Some(problem.cancel_flag());
        let result =
            AlnsRunner::run_with_cancel(&problem, &destroy_ops, &repair_ops, &alns_config, cancel)
                .map_err(LeagueError::InvalidConfig)?;
        iterations += (result.iterations as u64).min(epoch_len);
        epoch += 1;

        let state = result.best;
        if state.assignment.is_complete() {
            let candidate = Solution::evaluate(evaluator, state.schedule, state.assignment)?;
            if ctx.keep_best(&mut best, candidate) {
                trace!(
                    "worker {worker}: epoch {epoch}, best emissions {:.3}, time {:.3}",
                    best.total_emissions(),
                    best.total_time()
                );
            }
        }
        debug!(
            "worker {worker}: neighbourhood epoch {epoch} done, epoch cost {:.6}",
            result.best_cost
        );
    }

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
    use crate::optimizer::{SolverConfig, Termination};
    use crate::params::TravelOption;
    use crate::transport::assign_unconstrained;
    use std::sync::Mutex;
    use std::time::Duration;

    fn evaluator(target: f64) -> Evaluator {
        let table = ParameterTable::from_fn(6, |h, a| {
            let d = 1.0 + ((2 * h + a) % 6) as f64;
            TravelOption::new(20.0 * d, 5.0 * d, 1.0 * d, 3.0 * d + 1.0)
        })
        .unwrap();
        let e0: f64 = table.iter().map(|(_, _, o)| o.emission_plane).sum();
        Evaluator::new(table, e0, target).unwrap()
    }

    fn solution(ev: &Evaluator) -> Solution {
        let schedule = Schedule::build_initial(6).unwrap();
        Solution::evaluate(ev, schedule, assign_unconstrained(ev.table())).unwrap()
    }

    fn state(ev: &Evaluator) -> SeasonState {
        SeasonState::from_solution(&solution(ev))
    }

    #[test]
    fn test_destroy_clears_trips() {
        let ev = evaluator(30.0);
        let s = state(&ev);
        let mut rng = u_numflow::random::create_rng(42);
        let ops = [
            LeagueDestroy::Random,
            LeagueDestroy::Costliest {
                table: ev.table().clone(),
                objective: Objective::MinEmissions,
            },
            LeagueDestroy::Team,
        ];
        for op in &ops {
            let destroyed = op.destroy(&s, 0.2, &mut rng);
            assert!(!destroyed.assignment.is_complete(), "{}", op.name());
            assert!(destroyed.schedule.validate().is_ok(), "{}", op.name());
        }
    }

    #[test]
    fn test_costliest_removes_largest_contributions() {
        let ev = evaluator(30.0);
        let s = state(&ev);
        let mut rng = u_numflow::random::create_rng(1);
        let op = LeagueDestroy::Costliest {
            table: ev.table().clone(),
            objective: Objective::MinEmissions,
        };
        let destroyed = op.destroy(&s, 0.1, &mut rng);
        let removed_min = destroyed
            .assignment
            .missing()
            .iter()
            .map(|&(h, a)| ev.table().option(h, a).emission_train)
            .fold(f64::INFINITY, f64::min);
        let kept_max = destroyed
            .assignment
            .pairs()
            .filter(|(_, _, m)| m.is_some())
            .map(|(h, a, _)| ev.table().option(h, a).emission_train)
            .fold(0.0, f64::max);
        assert!(removed_min >= kept_max);
    }

    #[test]
    fn test_repairs_complete_within_budget() {
        let ev = evaluator(50.0);
        let s = state(&ev);
        let mut rng = u_numflow::random::create_rng(42);
        let destroyed = LeagueDestroy::Random.destroy(&s, 0.5, &mut rng);
        for kind in [RepairKind::Greedy, RepairKind::Randomized] {
            let op = LeagueRepair::new(kind, ev.table().clone(), ev.budget());
            let repaired = op.repair(&destroyed, &mut rng);
            assert!(repaired.assignment.is_complete());
            assert!(ev.meets_target(repaired.emissions), "{}", op.name());
            let (e, _) = repaired.assignment.totals(ev.table()).unwrap();
            assert!((e - repaired.emissions).abs() < 1e-9);
        }
    }

    #[test]
    fn test_run_improves_time_within_budget() {
        let ev = evaluator(40.0);
        let config = SolverConfig::default()
            .with_iterations_per_epoch(50)
            .with_max_iterations(100);
        let flag = AtomicBool::new(false);
        let ctx = SearchContext {
            evaluator: &ev,
            objective: Objective::MinTimeWithinBudget,
            config: &config,
            termination: Termination::new(None, config.max_iterations, &flag),
        };
        let start_time = ctx.seed_assignment().totals(ev.table()).unwrap().1;
        let report = run(&ctx, 0).unwrap();
        assert_eq!(report.iterations, 100);
        assert!(report.best.meets_target());
        assert!(report.best.total_time() <= start_time + 1e-9);
    }

    #[test]
    fn test_last_epoch_stops_at_iteration_limit() {
        let ev = evaluator(30.0);
        let config = SolverConfig::default()
            .with_iterations_per_epoch(50)
            .with_max_iterations(120);
        let flag = AtomicBool::new(false);
        let ctx = SearchContext {
            evaluator: &ev,
            objective: Objective::MinEmissions,
            config: &config,
            termination: Termination::new(None, config.max_iterations, &flag),
        };
        assert_eq!(run(&ctx, 0).unwrap().iterations, 120);
    }

    #[test]
    fn test_time_limit_cancels_long_epoch() {
        let ev = evaluator(30.0);
        let config = SolverConfig::default().with_iterations_per_epoch(1_000_000);
        let flag = AtomicBool::new(false);
        let ctx = SearchContext {
            evaluator: &ev,
            objective: Objective::MinEmissions,
            config: &config,
            termination: Termination::new(Some(Duration::from_millis(10)), u64::MAX, &flag),
        };
        let report = run(&ctx, 0).unwrap();
        let elapsed = ctx.termination.elapsed();
        assert!(elapsed < Duration::from_millis(500), "took {elapsed:?}");
        assert!(report.iterations < 1_000_000);
        assert!(report.best.assignment().is_complete());
    }

    #[test]
    fn test_destroy_degree_scales_cleared_trips() {
        let ev = evaluator(30.0);
        let s = state(&ev);
        let mut rng = u_numflow::random::create_rng(5);
        let op = LeagueDestroy::Costliest {
            table: ev.table().clone(),
            objective: Objective::MinEmissions,
        };
        let small = op.destroy(&s, 0.05, &mut rng).assignment.missing().len();
        let large = op.destroy(&s, 0.5, &mut rng).assignment.missing().len();
        assert_eq!(small, 2);
        assert_eq!(large, 15);
    }

    /// Random destroy that records the degrees it is called with.
    struct RecordingDestroy {
        degrees: Mutex<Vec<f64>>,
    }

    impl DestroyOperator<SeasonState> for RecordingDestroy {
        fn name(&self) -> &str {
            "recording"
        }

        fn destroy<R: Rng>(&self, state: &SeasonState, degree: f64, rng: &mut R) -> SeasonState {
            self.degrees.lock().unwrap().push(degree);
            LeagueDestroy::Random.destroy(state, degree, rng)
        }
    }

    #[test]
    fn test_epoch_uses_configured_destroy_degree() {
        let ev = evaluator(30.0);
        let problem = SeasonAlnsProblem::new(ev.clone(), &solution(&ev), Objective::MinEmissions);
        let repair = [LeagueRepair::new(RepairKind::Greedy, ev.table().clone(), ev.budget())];
        for degree in [0.04, 0.8] {
            let config = SolverConfig::default().with_destroy_degree(degree);
            let destroy = [RecordingDestroy {
                degrees: Mutex::new(Vec::new()),
            }];
            let alns_config = epoch_config(&config, 40, 9);
            AlnsRunner::run(&problem, &destroy, &repair, &alns_config).unwrap();
            let degrees = destroy[0].degrees.lock().unwrap();
            assert_eq!(degrees.len(), 40);
            assert!(degrees
                .iter()
                .all(|&d| d >= degree / 2.0 - 1e-12 && d <= degree + 1e-12));
        }
    }
}
