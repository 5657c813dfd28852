//! Independent check of produced solutions.
//!
//! The [`Validator`] does not trust anything a [`Solution`] carries. It
//! re-runs the timetable invariants, checks that every fixture has a mode
//! and recomputes the totals by walking the fixtures week by week, an
//! order unrelated to the row-major sum of the [`Evaluator`]. Any
//! disagreement is an internal defect.

use crate::error::LeagueError;
use crate::evaluation::Evaluator;
use crate::models::Solution;

/// Relative tolerance for comparing recomputed totals.
const RELATIVE_TOLERANCE: f64 = 1e-9;

/// Re-checks solutions against the evaluator they were produced with.
///
/// # Examples
///
/// ```
/// use u_league::evaluation::Evaluator;
/// use u_league::models::Solution;
/// use u_league::params::{ParameterTable, TravelOption};
/// use u_league::schedule::Schedule;
/// use u_league::transport::assign_unconstrained;
/// use u_league::validation::Validator;
///
/// let table = ParameterTable::from_fn(4, |_, _| TravelOption::new(100.0, 20.0, 1.0, 3.0))
///     .unwrap();
/// let evaluator = Evaluator::new(table, 1200.0, 50.0).unwrap();
/// let sol = Solution::evaluate(
///     &evaluator,
///     Schedule::build_initial(4).unwrap(),
///     assign_unconstrained(evaluator.table()),
/// )
/// .unwrap();
/// assert!(Validator::new(&evaluator).validate(&sol).is_ok());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    evaluator: &'a Evaluator,
}

impl<'a> Validator<'a> {
    /// Creates a validator.
    pub fn new(evaluator: &'a Evaluator) -> Self {
        Self { evaluator }
    }

    /// Checks `solution`, returning the first defect found.
    pub fn validate(&self, solution: &Solution) -> Result<(), LeagueError> {
        let n = self.evaluator.num_teams();
        let schedule = solution.schedule();
        let assignment = solution.assignment();
        for size in [schedule.num_teams(), assignment.num_teams()] {
            if size != n {
                return Err(LeagueError::TableSizeMismatch {
                    expected: n,
                    actual: size,
                });
            }
        }
        schedule.validate()?;
        // A valid timetable has a fixture for every off-diagonal pair
        if let Some(team) = (0..n).find(|&t| assignment.mode(t, t).is_some()) {
            return Err(LeagueError::SelfTravel(team));
        }

        let table = self.evaluator.table();
        let mut emissions = 0.0;
        let mut time = 0.0;
        for fixture in schedule.fixtures() {
            let (home, away) = (fixture.home, fixture.away);
            let mode = assignment
                .mode(home, away)
                .ok_or(LeagueError::IncompleteAssignment { home, away })?;
            let option = table
                .get(home, away)
                .ok_or(LeagueError::MissingTravelOption { home, away })?;
            emissions += option.emission(mode);
            time += option.time(mode);
        }

        let eval = solution.evaluation();
        let reduction = self.evaluator.percent_reduction(emissions);
        check("total emissions", eval.total_emissions, emissions)?;
        check("total time", eval.total_time, time)?;
        check("percent reduction", eval.percent_reduction, reduction)?;

        let meets = self.evaluator.meets_target(emissions);
        if eval.meets_target != meets {
            return Err(LeagueError::EvaluationMismatch {
                quantity: "target flag",
                reported: f64::from(u8::from(eval.meets_target)),
                recomputed: f64::from(u8::from(meets)),
            });
        }

        let breaks = schedule.breaks();
        if solution.breaks() != breaks {
            return Err(LeagueError::EvaluationMismatch {
                quantity: "breaks",
                reported: solution.breaks() as f64,
                recomputed: breaks as f64,
            });
        }
        Ok(())
    }
}

fn check(quantity: &'static str, reported: f64, recomputed: f64) -> Result<(), LeagueError> {
    let tol = RELATIVE_TOLERANCE * recomputed.abs().max(1.0);
    if (reported - recomputed).abs() <= tol {
        Ok(())
    } else {
        Err(LeagueError::EvaluationMismatch {
            quantity,
            reported,
            recomputed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransportMode;
    use crate::params::{ParameterTable, TravelOption};
    use crate::schedule::{Meeting, Schedule};
    use crate::transport::{assign_unconstrained, Assignment};

    fn setup() -> (Evaluator, Solution) {
        let table = ParameterTable::from_fn(4, |h, a| {
            TravelOption::new(50.0 + (h * 4 + a) as f64, 10.0 + a as f64, 1.0, 3.0 + h as f64)
        })
        .unwrap();
        let evaluator = Evaluator::new(table, 800.0, 20.0).unwrap();
        let sol = Solution::evaluate(
            &evaluator,
            Schedule::build_initial(4).unwrap(),
            assign_unconstrained(evaluator.table()),
        )
        .unwrap();
        (evaluator, sol)
    }

    #[test]
    fn test_valid_solution_passes() {
        let (ev, sol) = setup();
        assert!(Validator::new(&ev).validate(&sol).is_ok());
    }

    #[test]
    fn test_detects_tampered_totals() {
        let (ev, mut sol) = setup();
        sol.evaluation.total_time += 1.0;
        let err = Validator::new(&ev).validate(&sol).unwrap_err();
        assert!(matches!(
            err,
            LeagueError::EvaluationMismatch {
                quantity: "total time",
                ..
            }
        ));
        assert!(err.is_internal());
    }

    #[test]
    fn test_detects_wrong_target_flag() {
        let (ev, mut sol) = setup();
        sol.evaluation.meets_target = !sol.evaluation.meets_target;
        assert!(matches!(
            Validator::new(&ev).validate(&sol),
            Err(LeagueError::EvaluationMismatch {
                quantity: "target flag",
                ..
            })
        ));
    }

    #[test]
    fn test_detects_missing_mode() {
        let (ev, mut sol) = setup();
        sol.assignment.clear(2, 1);
        assert!(matches!(
            Validator::new(&ev).validate(&sol),
            Err(LeagueError::IncompleteAssignment { home: 2, away: 1 })
        ));
    }

    #[test]
    fn test_detects_broken_timetable() {
        let (ev, mut sol) = setup();
        let mut weeks = sol.schedule.weeks().to_vec();
        weeks[0][0] = Meeting::new(weeks[0][0].away, weeks[0][0].home);
        sol.schedule = Schedule::from_weeks(4, weeks);
        assert!(matches!(
            Validator::new(&ev).validate(&sol),
            Err(LeagueError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_detects_stale_breaks() {
        let (ev, mut sol) = setup();
        sol.breaks += 1;
        assert!(matches!(
            Validator::new(&ev).validate(&sol),
            Err(LeagueError::EvaluationMismatch { quantity: "breaks", .. })
        ));
    }

    #[test]
    fn test_detects_mode_without_fixture() {
        let (ev, mut sol) = setup();
        let mut value = serde_json::to_value(&sol.assignment).unwrap();
        value["modes"][0] = value["modes"][1].clone();
        sol.assignment = serde_json::from_value(value).unwrap();
        assert!(matches!(
            Validator::new(&ev).validate(&sol),
            Err(LeagueError::SelfTravel(0))
        ));
    }

    #[test]
    fn test_size_mismatch() {
        let (ev, mut sol) = setup();
        sol.assignment = Assignment::uniform(6, TransportMode::Train);
        assert!(matches!(
            Validator::new(&ev).validate(&sol),
            Err(LeagueError::TableSizeMismatch { expected: 4, actual: 6 })
        ));
    }
}
