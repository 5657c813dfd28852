//! Error types.
//!
//! Two classes of failure are distinguished:
//!
//! - **Malformed input**: rejected before any search starts (bad team
//!   count, missing or negative parameters, out-of-range target, bad
//!   configuration).
//! - **Internal defects**: a produced solution that breaks a timetable
//!   invariant or whose totals do not match an independent recomputation.
//!   These indicate a bug in a move operator and are never recoverable.
//!
//! Infeasibility of the reduction target and budget exhaustion are not
//! errors; they are reported through
//! [`SolveOutcome`](crate::models::SolveOutcome).

use thiserror::Error;

use crate::schedule::ScheduleViolation;

/// Errors produced by the league scheduling crate.
#[derive(Debug, Error)]
pub enum LeagueError {
    /// The number of teams is odd or smaller than two.
    #[error("a double round-robin needs an even number of at least 2 teams, got {count}")]
    InvalidTeamCount {
        /// Number of teams supplied.
        count: usize,
    },

    /// A team name appears twice in the team set.
    #[error("duplicate team '{0}'")]
    DuplicateTeam(String),

    /// A record references a team that is not in the team set.
    #[error("unknown team '{0}'")]
    UnknownTeam(String),

    /// No travel option for a required ordered pair.
    #[error("missing travel option for home {home} / away {away}")]
    MissingTravelOption {
        /// Hosting team index.
        home: usize,
        /// Travelling team index.
        away: usize,
    },

    /// A travel parameter is negative or not finite.
    #[error("invalid {field} = {value} for home {home} / away {away}")]
    InvalidParameter {
        /// Hosting team index.
        home: usize,
        /// Travelling team index.
        away: usize,
        /// Name of the offending field.
        field: &'static str,
        /// Offending value.
        value: f64,
    },

    /// A travel option was supplied for a team against itself.
    #[error("team {0} cannot travel to itself")]
    SelfTravel(usize),

    /// Two inputs disagree on the number of teams.
    #[error("size mismatch: expected {expected} teams, got {actual}")]
    TableSizeMismatch {
        /// Expected number of teams.
        expected: usize,
        /// Number found.
        actual: usize,
    },

    /// Reduction target outside `[0, 100)`.
    #[error("reduction target must lie in [0, 100), got {0}")]
    InvalidTarget(f64),

    /// Baseline emissions are not strictly positive and finite.
    #[error("baseline emissions must be positive and finite, got {0}")]
    InvalidBaseline(f64),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON input could not be parsed.
    #[error("malformed JSON input: {0}")]
    Json(#[from] serde_json::Error),

    /// A timetable invariant is broken.
    #[error("schedule invariant violated: {0}")]
    InvariantViolation(#[from] ScheduleViolation),

    /// A fixture has no transport mode.
    #[error("fixture home {home} / away {away} has no transport mode")]
    IncompleteAssignment {
        /// Hosting team index.
        home: usize,
        /// Travelling team index.
        away: usize,
    },

    /// A reported total differs from its independent recomputation.
    #[error("{quantity} mismatch: reported {reported}, recomputed {recomputed}")]
    EvaluationMismatch {
        /// Which total disagrees.
        quantity: &'static str,
        /// Value carried by the solution.
        reported: f64,
        /// Value recomputed from raw fixtures.
        recomputed: f64,
    },
}

impl LeagueError {
    /// Returns `true` for internal-consistency defects.
    ///
    /// These are never caused by caller input and must not be retried.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            LeagueError::InvariantViolation(_)
                | LeagueError::IncompleteAssignment { .. }
                | LeagueError::EvaluationMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_classification() {
        assert!(!LeagueError::InvalidTeamCount { count: 3 }.is_internal());
        assert!(!LeagueError::InvalidTarget(120.0).is_internal());
        assert!(LeagueError::IncompleteAssignment { home: 0, away: 1 }.is_internal());
        assert!(LeagueError::EvaluationMismatch {
            quantity: "total_emissions",
            reported: 1.0,
            recomputed: 2.0,
        }
        .is_internal());
        assert!(
            LeagueError::InvariantViolation(ScheduleViolation::SelfPlay { week: 0, team: 1 })
                .is_internal()
        );
    }

    #[test]
    fn test_display_messages() {
        let err = LeagueError::InvalidTeamCount { count: 5 };
        assert!(err.to_string().contains("got 5"));

        let err = LeagueError::MissingTravelOption { home: 2, away: 3 };
        assert_eq!(err.to_string(), "missing travel option for home 2 / away 3");
    }
}
