//! Search outcomes and reports.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::Solution;
use crate::evaluation::Objective;
use crate::optimizer::Strategy;

/// Optimality flag of a finished solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// The exact strategy closed its search.
    ProvenOptimal,
    /// A feasible solution, not proven optimal.
    BestFound,
    /// No assignment meets the reduction target.
    Infeasible,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::ProvenOptimal => write!(f, "proven optimal"),
            SolveStatus::BestFound => write!(f, "best found under budget"),
            SolveStatus::Infeasible => write!(f, "infeasible"),
        }
    }
}

/// Why the reduction target cannot be met.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Infeasibility {
    /// Lowest-emission solution found.
    pub best: Solution,
    /// Emissions of `best`; no season can emit less.
    pub best_emissions: f64,
    /// Emission budget the target requires.
    pub required_emissions: f64,
}

impl Infeasibility {
    /// Smallest target `X` that `best` would meet, in percent.
    pub fn achievable_reduction(&self) -> f64 {
        self.best.percent_reduction()
    }
}

/// Result of a solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveOutcome {
    /// Feasible and proven optimal.
    Optimal(Solution),
    /// Feasible, best found within the search budget.
    BestFound(Solution),
    /// The target is out of reach; carries the closest solution.
    Infeasible(Infeasibility),
}

impl SolveOutcome {
    /// The optimality flag.
    pub fn status(&self) -> SolveStatus {
        match self {
            SolveOutcome::Optimal(_) => SolveStatus::ProvenOptimal,
            SolveOutcome::BestFound(_) => SolveStatus::BestFound,
            SolveOutcome::Infeasible(_) => SolveStatus::Infeasible,
        }
    }

    /// The solution carried by any outcome.
    pub fn solution(&self) -> &Solution {
        match self {
            SolveOutcome::Optimal(s) | SolveOutcome::BestFound(s) => s,
            SolveOutcome::Infeasible(inf) => &inf.best,
        }
    }

    /// Consumes the outcome, returning its solution.
    pub fn into_solution(self) -> Solution {
        match self {
            SolveOutcome::Optimal(s) | SolveOutcome::BestFound(s) => s,
            SolveOutcome::Infeasible(inf) => inf.best,
        }
    }

    /// Returns `true` if the reduction target is met.
    pub fn is_feasible(&self) -> bool {
        !matches!(self, SolveOutcome::Infeasible(_))
    }

    /// Returns `true` if the solution is proven optimal.
    pub fn is_proven_optimal(&self) -> bool {
        matches!(self, SolveOutcome::Optimal(_))
    }
}

/// Counters collected during a solve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Search iterations summed over all workers.
    pub iterations: u64,
    /// Branch-and-bound nodes explored by the exact strategy.
    pub nodes: u64,
    /// Number of workers that reported.
    pub workers: usize,
    /// Wall-clock time of the solve.
    pub elapsed: Duration,
    /// Whether the external interrupt flag stopped the search.
    pub interrupted: bool,
}

/// Everything a caller needs to interpret a solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    /// The outcome.
    pub outcome: SolveOutcome,
    /// Baseline emissions `E₀` used.
    pub baseline: f64,
    /// Reduction target `X` in percent.
    pub target: f64,
    /// Emission budget `(1 − X/100) · E₀`.
    pub budget: f64,
    /// Objective minimised.
    pub objective: Objective,
    /// Strategy that actually ran (never `Auto`).
    pub strategy: Strategy,
    /// Search counters.
    pub stats: SearchStats,
}

impl SolveReport {
    /// The optimality flag.
    pub fn status(&self) -> SolveStatus {
        self.outcome.status()
    }

    /// The solution carried by the outcome.
    pub fn solution(&self) -> &Solution {
        self.outcome.solution()
    }
}
