//! Baseline emissions `E₀`.

use serde::{Deserialize, Serialize};

use crate::error::LeagueError;
use crate::models::TransportMode;
use crate::params::ParameterTable;
use crate::schedule::Schedule;
use crate::transport::{assign_unconstrained, Assignment};

/// Where the baseline emissions `E₀` come from.
///
/// `E₀` is always resolved to a number before the search starts and then
/// passed explicitly to the [`Evaluator`](super::Evaluator).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineSource {
    /// Initial circle-method schedule with emission-minimal modes.
    #[default]
    Reference,
    /// A value supplied by the caller.
    External(f64),
    /// Every trip made by the same mode, e.g. the all-plane status quo.
    Uniform(TransportMode),
    /// Modes actually used in a past season.
    Historic(Assignment),
}

impl BaselineSource {
    /// Resolves the baseline against `table`.
    ///
    /// Fails if the result is not strictly positive and finite, or if a
    /// historic assignment does not cover every pairing of the table.
    pub fn resolve(&self, table: &ParameterTable) -> Result<f64, LeagueError> {
        let n = table.size();
        let e0 = match self {
            BaselineSource::External(value) => *value,
            BaselineSource::Reference => {
                let schedule = Schedule::build_initial(n)?;
                let assignment = assign_unconstrained(table);
                fixture_emissions(table, &schedule, &assignment)?
            }
            BaselineSource::Uniform(mode) => {
                let schedule = Schedule::build_initial(n)?;
                fixture_emissions(table, &schedule, &Assignment::uniform(n, *mode))?
            }
            BaselineSource::Historic(assignment) => {
                if assignment.num_teams() != n {
                    return Err(LeagueError::TableSizeMismatch {
                        expected: n,
                        actual: assignment.num_teams(),
                    });
                }
                if let Some((home, away)) = assignment.first_missing() {
                    return Err(LeagueError::InvalidConfig(format!(
                        "historic baseline has no mode for home {home} / away {away}"
                    )));
                }
                let schedule = Schedule::build_initial(n)?;
                fixture_emissions(table, &schedule, assignment)?
            }
        };
        if !e0.is_finite() || e0 <= 0.0 {
            return Err(LeagueError::InvalidBaseline(e0));
        }
        Ok(e0)
    }
}

fn fixture_emissions(
    table: &ParameterTable,
    schedule: &Schedule,
    assignment: &Assignment,
) -> Result<f64, LeagueError> {
    let mut total = 0.0;
    for fixture in schedule.fixtures() {
        let option = table
            .get(fixture.home, fixture.away)
            .ok_or(LeagueError::MissingTravelOption {
                home: fixture.home,
                away: fixture.away,
            })?;
        let mode = assignment
            .mode(fixture.home, fixture.away)
            .ok_or(LeagueError::IncompleteAssignment {
                home: fixture.home,
                away: fixture.away,
            })?;
        total += option.emission(mode);
    }
    Ok(total)
}
