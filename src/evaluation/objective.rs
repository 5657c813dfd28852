//! Lexicographic objectives and the total order on candidates.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Evaluation;
use crate::models::Solution;

/// What the search minimises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Total emissions first, total time second.
    #[default]
    MinEmissions,
    /// Total time subject to the emission budget, emissions second.
    MinTimeWithinBudget,
}

impl Objective {
    /// `(primary, secondary)` key of a feasible evaluation.
    pub fn key(self, eval: &Evaluation) -> (f64, f64) {
        match self {
            Objective::MinEmissions => (eval.total_emissions, eval.total_time),
            Objective::MinTimeWithinBudget => (eval.total_time, eval.total_emissions),
        }
    }

    /// Orders two evaluations, best first.
    ///
    /// Feasible evaluations come before infeasible ones. Feasible ones are
    /// ordered by [`key`](Self::key); infeasible ones by emissions then
    /// time, i.e. by how close they are to the budget.
    pub fn compare(self, a: &Evaluation, b: &Evaluation) -> Ordering {
        match (a.meets_target, b.meets_target) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (true, true) => cmp_pair(self.key(a), self.key(b)),
            (false, false) => cmp_pair(
                (a.total_emissions, a.total_time),
                (b.total_emissions, b.total_time),
            ),
        }
    }

    /// Total order on solutions, best first.
    ///
    /// Evaluations are compared with [`compare`](Self::compare); exact ties
    /// go to fewer breaks, then the smaller schedule encoding, then the
    /// smaller assignment encoding. Two solutions compare equal only if
    /// they have the same timetable and the same modes.
    pub fn rank(self, a: &Solution, b: &Solution) -> Ordering {
        self.compare(a.evaluation(), b.evaluation())
            .then_with(|| a.breaks().cmp(&b.breaks()))
            .then_with(|| a.schedule().encoding().cmp(&b.schedule().encoding()))
            .then_with(|| a.assignment().encoding().cmp(&b.assignment().encoding()))
    }

    /// Returns `true` if `a` ranks strictly before `b`.
    pub fn is_better(self, a: &Solution, b: &Solution) -> bool {
        self.rank(a, b) == Ordering::Less
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Objective::MinEmissions => write!(f, "min-emissions"),
            Objective::MinTimeWithinBudget => write!(f, "min-time-within-budget"),
        }
    }
}

fn cmp_pair(a: (f64, f64), b: (f64, f64)) -> Ordering {
    a.0.total_cmp(&b.0).then_with(|| a.1.total_cmp(&b.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(e: f64, t: f64, ok: bool) -> Evaluation {
        Evaluation {
            total_emissions: e,
            total_time: t,
            percent_reduction: 0.0,
            meets_target: ok,
        }
    }

    #[test]
    fn test_feasible_first() {
        let obj = Objective::MinEmissions;
        assert_eq!(obj.compare(&eval(90.0, 9.0, true), &eval(10.0, 1.0, false)), Ordering::Less);
    }

    #[test]
    fn test_emissions_before_time() {
        let obj = Objective::MinEmissions;
        assert_eq!(obj.compare(&eval(10.0, 90.0, true), &eval(11.0, 1.0, true)), Ordering::Less);
        assert_eq!(obj.compare(&eval(10.0, 5.0, true), &eval(10.0, 6.0, true)), Ordering::Less);
    }

    #[test]
    fn test_time_within_budget() {
        let obj = Objective::MinTimeWithinBudget;
        assert_eq!(obj.compare(&eval(11.0, 1.0, true), &eval(10.0, 90.0, true)), Ordering::Less);
        // Infeasible candidates are ordered by emissions whatever the objective
        assert_eq!(obj.compare(&eval(11.0, 90.0, false), &eval(12.0, 1.0, false)), Ordering::Less);
    }

    #[test]
    fn test_display() {
        assert_eq!(Objective::MinTimeWithinBudget.to_string(), "min-time-within-budget");
    }
}
