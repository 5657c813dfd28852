//! State shared by the search strategies.

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{SolverConfig, Termination};
use crate::error::LeagueError;
use crate::evaluation::{Evaluation, Evaluator, Objective};
use crate::models::Solution;
use crate::schedule::Schedule;
use crate::transport::{assign_unconstrained, assign_within_budget, Assignment};

/// Weight of the secondary objective in the scalar energy.
const SECONDARY_WEIGHT: f64 = 1e-3;
/// Weight of one venue break in the scalar energy.
const BREAK_WEIGHT: f64 = 1e-6;
/// Energy added to any candidate over the emission budget.
const INFEASIBLE_PENALTY: f64 = 1e6;

/// Read-only inputs of one solve, shared by reference with every worker.
pub(crate) struct SearchContext<'a> {
    pub evaluator: &'a Evaluator,
    pub objective: Objective,
    pub config: &'a SolverConfig,
    pub termination: Termination<'a>,
}

impl SearchContext<'_> {
    /// Deterministic generator of `worker`.
    pub fn rng(&self, worker: usize) -> StdRng {
        StdRng::seed_from_u64(self.config.seed.wrapping_add(worker as u64))
    }

    /// Starting candidate of `worker`.
    ///
    /// Worker 0 starts from the circle-method timetable, the others from a
    /// randomly perturbed copy. Modes start emission-minimal, or greedily
    /// upgraded within the budget when time is minimised.
    pub fn initial_solution(
        &self,
        worker: usize,
        rng: &mut StdRng,
    ) -> Result<Solution, LeagueError> {
        let n = self.evaluator.num_teams();
        let mut schedule = Schedule::build_initial(n)?;
        if worker > 0 {
            let moves = 4 * schedule.num_weeks();
            schedule.perturb(rng, moves);
        }
        Solution::evaluate(self.evaluator, schedule, self.seed_assignment())
    }

    /// Best assignment the cheap constructive rules can give.
    pub fn seed_assignment(&self) -> Assignment {
        let table = self.evaluator.table();
        match self.objective {
            Objective::MinEmissions => assign_unconstrained(table),
            Objective::MinTimeWithinBudget => assign_within_budget(table, self.evaluator.budget())
                .unwrap_or_else(|| assign_unconstrained(table)),
        }
    }

    /// Keeps the better of `incumbent` and `candidate`.
    pub fn keep_best(&self, incumbent: &mut Solution, candidate: Solution) -> bool {
        if self.objective.is_better(&candidate, incumbent) {
            *incumbent = candidate;
            true
        } else {
            false
        }
    }
}

/// What a worker sends to the coordinator.
#[derive(Debug)]
pub(crate) struct WorkerReport {
    pub worker: usize,
    pub best: Solution,
    pub iterations: u64,
    pub nodes: u64,
    pub proven_optimal: bool,
}

/// Maps lexicographic keys to one number for acceptance rules and fitness.
///
/// Totals are divided by the mean per-trip gap between the two modes, so a
/// temperature of 1 accepts a typical single-trip worsening with
/// probability `1/e`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scalarizer {
    objective: Objective,
    emission_scale: f64,
    time_scale: f64,
}

impl Scalarizer {
    pub fn new(evaluator: &Evaluator, objective: Objective) -> Self {
        let mut de = 0.0;
        let mut dt = 0.0;
        let mut pairs = 0usize;
        for (_, _, option) in evaluator.table().iter() {
            de += (option.emission_plane - option.emission_train).abs();
            dt += (option.time_plane - option.time_train).abs();
            pairs += 1;
        }
        let scale = |sum: f64| {
            let mean = if pairs > 0 { sum / pairs as f64 } else { 0.0 };
            if mean > 0.0 {
                mean
            } else {
                1.0
            }
        };
        Self {
            objective,
            emission_scale: scale(de),
            time_scale: scale(dt),
        }
    }

    /// Energy of a candidate within the budget; lower is better.
    pub fn energy(&self, emissions: f64, time: f64, breaks: usize) -> f64 {
        let e = emissions / self.emission_scale;
        let t = time / self.time_scale;
        let (primary, secondary) = match self.objective {
            Objective::MinEmissions => (e, t),
            Objective::MinTimeWithinBudget => (t, e),
        };
        primary + SECONDARY_WEIGHT * secondary + BREAK_WEIGHT * breaks as f64
    }

    /// Energy plus a penalty growing with the budget excess.
    pub fn fitness(&self, evaluator: &Evaluator, eval: &Evaluation, breaks: usize) -> f64 {
        let base = self.energy(eval.total_emissions, eval.total_time, breaks);
        if eval.meets_target {
            base
        } else {
            INFEASIBLE_PENALTY + evaluator.excess(eval.total_emissions) / self.emission_scale + base
        }
    }
}
