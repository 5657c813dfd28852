//! Evaluated solutions.

use serde::{Deserialize, Serialize};

use super::{Fixture, TeamSet, TransportMode};
use crate::error::LeagueError;
use crate::evaluation::{Evaluation, Evaluator};
use crate::schedule::Schedule;
use crate::transport::Assignment;

/// A timetable with its transport modes and evaluated totals.
///
/// Solutions handed out by the optimizer are frozen: the crate's search
/// strategies mutate their private working copies, callers only read.
///
/// # Examples
///
/// ```
/// use u_league::evaluation::Evaluator;
/// use u_league::models::{Solution, TransportMode};
/// use u_league::params::{ParameterTable, TravelOption};
/// use u_league::schedule::Schedule;
/// use u_league::transport::Assignment;
///
/// let table = ParameterTable::from_fn(4, |_, _| TravelOption::new(100.0, 20.0, 1.0, 3.0))
///     .unwrap();
/// let evaluator = Evaluator::new(table, 1200.0, 10.0).unwrap();
/// let sol = Solution::evaluate(
///     &evaluator,
///     Schedule::build_initial(4).unwrap(),
///     Assignment::uniform(4, TransportMode::Plane),
/// )
/// .unwrap();
/// assert_eq!(sol.total_emissions(), 1200.0);
/// assert!(!sol.meets_target());
/// assert_eq!(sol.fixtures().len(), 12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub(crate) schedule: Schedule,
    pub(crate) assignment: Assignment,
    pub(crate) evaluation: Evaluation,
    pub(crate) breaks: usize,
}

impl Solution {
    /// Evaluates `schedule` with `assignment` and freezes the result.
    pub fn evaluate(
        evaluator: &Evaluator,
        schedule: Schedule,
        assignment: Assignment,
    ) -> Result<Self, LeagueError> {
        let evaluation = evaluator.evaluate(&schedule, &assignment)?;
        Ok(Self::from_parts(schedule, assignment, evaluation))
    }

    pub(crate) fn from_parts(
        schedule: Schedule,
        assignment: Assignment,
        evaluation: Evaluation,
    ) -> Self {
        let breaks = schedule.breaks();
        Self {
            schedule,
            assignment,
            evaluation,
            breaks,
        }
    }

    /// The timetable.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// The transport modes.
    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// Totals as computed by the evaluator.
    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    /// Number of venue breaks in the timetable.
    pub fn breaks(&self) -> usize {
        self.breaks
    }

    /// Total emissions.
    pub fn total_emissions(&self) -> f64 {
        self.evaluation.total_emissions
    }

    /// Total travel time.
    pub fn total_time(&self) -> f64 {
        self.evaluation.total_time
    }

    /// Percentage reduction relative to the baseline.
    pub fn percent_reduction(&self) -> f64 {
        self.evaluation.percent_reduction
    }

    /// Whether the reduction target is met.
    pub fn meets_target(&self) -> bool {
        self.evaluation.meets_target
    }

    /// Fixtures in week order with their transport modes.
    ///
    /// Fixtures without a mode are skipped; the validator rejects such
    /// solutions.
    pub fn fixtures(&self) -> Vec<(Fixture, TransportMode)> {
        self.schedule
            .fixtures()
            .into_iter()
            .filter_map(|f| self.assignment.mode(f.home, f.away).map(|m| (f, m)))
            .collect()
    }

    /// One line per fixture, e.g. `week 3: Lyon vs Nice (train)`.
    pub fn describe(&self, teams: &TeamSet) -> Vec<String> {
        self.fixtures()
            .into_iter()
            .map(|(f, mode)| format!("{} ({mode})", f.describe(teams)))
            .collect()
    }
}
