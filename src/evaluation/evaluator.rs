//! Objective evaluator.

use serde::{Deserialize, Serialize};

use crate::error::LeagueError;
use crate::params::ParameterTable;
use crate::schedule::Schedule;
use crate::transport::Assignment;

/// Relative tolerance used for every budget comparison.
pub const BUDGET_TOLERANCE: f64 = 1e-9;

/// Returns `true` if `emissions` stays within `budget` up to [`BUDGET_TOLERANCE`].
pub fn fits_budget(emissions: f64, budget: f64) -> bool {
    emissions <= budget + BUDGET_TOLERANCE * budget.abs().max(1.0)
}

/// Totals of a (schedule, assignment) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Sum of chosen-mode emissions over all fixtures.
    pub total_emissions: f64,
    /// Sum of chosen-mode travel times over all fixtures.
    pub total_time: f64,
    /// `100 · (1 − total_emissions / E₀)`.
    pub percent_reduction: f64,
    /// Whether `total_emissions ≤ (1 − X/100) · E₀`.
    pub meets_target: bool,
}

/// Emissions and time of one team's away trips.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamTotals {
    /// Team index.
    pub team: usize,
    /// Number of away trips.
    pub trips: usize,
    /// Emissions of those trips.
    pub emissions: f64,
    /// Travel time of those trips.
    pub time: f64,
}

/// Pure function from (schedule, assignment) to totals and reduction.
///
/// Owns the parameter table, the baseline `E₀` and the target `X`; all
/// three are explicit inputs, so the same code can be re-run against a
/// different baseline.
///
/// # Examples
///
/// ```
/// use u_league::evaluation::Evaluator;
/// use u_league::params::{ParameterTable, TravelOption};
/// use u_league::schedule::Schedule;
/// use u_league::transport::assign_unconstrained;
///
/// let table = ParameterTable::from_fn(4, |_, _| TravelOption::new(100.0, 20.0, 1.0, 3.0))
///     .unwrap();
/// let evaluator = Evaluator::new(table, 1200.0, 50.0).unwrap();
///
/// let schedule = Schedule::build_initial(4).unwrap();
/// let assignment = assign_unconstrained(evaluator.table());
/// let eval = evaluator.evaluate(&schedule, &assignment).unwrap();
/// assert_eq!(eval.total_emissions, 240.0);
/// assert!((eval.percent_reduction - 80.0).abs() < 1e-9);
/// assert!(eval.meets_target);
/// ```
#[derive(Debug, Clone)]
pub struct Evaluator {
    table: ParameterTable,
    baseline: f64,
    target: f64,
    budget: f64,
}

impl Evaluator {
    /// Creates an evaluator.
    ///
    /// Fails if the table is incomplete, `baseline` is not positive and
    /// finite, or `target` lies outside `[0, 100)`.
    pub fn new(table: ParameterTable, baseline: f64, target: f64) -> Result<Self, LeagueError> {
        table.validate_for(table.size())?;
        if !baseline.is_finite() || baseline <= 0.0 {
            return Err(LeagueError::InvalidBaseline(baseline));
        }
        if !(0.0..100.0).contains(&target) {
            return Err(LeagueError::InvalidTarget(target));
        }
        Ok(Self {
            table,
            baseline,
            target,
            budget: (1.0 - target / 100.0) * baseline,
        })
    }

    /// The parameter table.
    pub fn table(&self) -> &ParameterTable {
        &self.table
    }

    /// Number of teams.
    pub fn num_teams(&self) -> usize {
        self.table.size()
    }

    /// Baseline emissions `E₀`.
    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    /// Reduction target `X` in percent.
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Emission budget `(1 − X/100) · E₀`.
    pub fn budget(&self) -> f64 {
        self.budget
    }

    /// Lowest total emissions any season can reach.
    pub fn min_emissions(&self) -> f64 {
        self.table.min_total_emissions()
    }

    /// Percentage reduction of `emissions` relative to `E₀`.
    pub fn percent_reduction(&self, emissions: f64) -> f64 {
        100.0 * (1.0 - emissions / self.baseline)
    }

    /// Returns `true` if `emissions` meets the reduction target.
    pub fn meets_target(&self, emissions: f64) -> bool {
        fits_budget(emissions, self.budget)
    }

    /// Amount by which `emissions` exceeds the budget (zero if within).
    pub fn excess(&self, emissions: f64) -> f64 {
        (emissions - self.budget).max(0.0)
    }

    /// Builds an [`Evaluation`] from precomputed totals.
    pub fn from_totals(&self, total_emissions: f64, total_time: f64) -> Evaluation {
        Evaluation {
            total_emissions,
            total_time,
            percent_reduction: self.percent_reduction(total_emissions),
            meets_target: self.meets_target(total_emissions),
        }
    }

    /// Evaluates a schedule with its assignment.
    ///
    /// Sums over the scheduled pairings in row-major `(home, away)` order,
    /// so the result does not depend on the week layout. O(N²).
    pub fn evaluate(
        &self,
        schedule: &Schedule,
        assignment: &Assignment,
    ) -> Result<Evaluation, LeagueError> {
        let n = self.num_teams();
        for size in [schedule.num_teams(), assignment.num_teams()] {
            if size != n {
                return Err(LeagueError::TableSizeMismatch {
                    expected: n,
                    actual: size,
                });
            }
        }

        let mut emissions = 0.0;
        let mut time = 0.0;
        for home in 0..n {
            for away in 0..n {
                if home == away || schedule.week_of(home, away).is_none() {
                    continue;
                }
                let mode = assignment
                    .mode(home, away)
                    .ok_or(LeagueError::IncompleteAssignment { home, away })?;
                let option = self.table.option(home, away);
                emissions += option.emission(mode);
                time += option.time(mode);
            }
        }
        Ok(self.from_totals(emissions, time))
    }

    /// Per-team totals of away trips.
    pub fn per_team(
        &self,
        schedule: &Schedule,
        assignment: &Assignment,
    ) -> Result<Vec<TeamTotals>, LeagueError> {
        let n = self.num_teams();
        let mut totals: Vec<TeamTotals> = (0..n)
            .map(|team| TeamTotals {
                team,
                trips: 0,
                emissions: 0.0,
                time: 0.0,
            })
            .collect();
        for fixture in schedule.fixtures() {
            let option = self
                .table
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
            let entry = &mut totals[fixture.away];
            entry.trips += 1;
            entry.emissions += option.emission(mode);
            entry.time += option.time(mode);
        }
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransportMode;
    use crate::params::TravelOption;

    fn setup() -> Evaluator {
        let table = ParameterTable::from_fn(4, |h, a| {
            let d = (h as f64 - a as f64).abs();
            TravelOption::new(10.0 * d, 2.0 * d, d, 3.0 * d)
        })
        .unwrap();
        // All-plane season emits 10·20 = 200
        Evaluator::new(table, 200.0, 25.0).unwrap()
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let table = ParameterTable::from_fn(2, |_, _| TravelOption::new(1.0, 1.0, 1.0, 1.0))
            .unwrap();
        assert!(matches!(
            Evaluator::new(table.clone(), 0.0, 10.0),
            Err(LeagueError::InvalidBaseline(_))
        ));
        assert!(matches!(
            Evaluator::new(table.clone(), 10.0, 100.0),
            Err(LeagueError::InvalidTarget(_))
        ));
        assert!(matches!(
            Evaluator::new(table, 10.0, -1.0),
            Err(LeagueError::InvalidTarget(_))
        ));
        assert!(matches!(
            Evaluator::new(ParameterTable::new(2), 10.0, 1.0),
            Err(LeagueError::MissingTravelOption { .. })
        ));
    }

    #[test]
    fn test_budget() {
        let ev = setup();
        assert!((ev.budget() - 150.0).abs() < 1e-12);
        assert!(ev.meets_target(150.0));
        assert!(!ev.meets_target(150.1));
        assert!((ev.excess(160.0) - 10.0).abs() < 1e-12);
        assert_eq!(ev.excess(100.0), 0.0);
    }

    #[test]
    fn test_evaluate_all_plane() {
        let ev = setup();
        let s = Schedule::build_initial(4).unwrap();
        let a = Assignment::uniform(4, TransportMode::Plane);
        let e = ev.evaluate(&s, &a).unwrap();
        assert!((e.total_emissions - 200.0).abs() < 1e-10);
        assert!((e.total_time - 20.0).abs() < 1e-10);
        assert!(e.percent_reduction.abs() < 1e-10);
        assert!(!e.meets_target);
    }

    #[test]
    fn test_evaluate_independent_of_week_layout() {
        let ev = setup();
        let a = Assignment::from_fn(4, |h, _| {
            if h % 2 == 0 {
                TransportMode::Plane
            } else {
                TransportMode::Train
            }
        });
        let s1 = Schedule::build_initial(4).unwrap();
        let mut s2 = s1.clone();
        s2.swap_weeks(0, 5);
        s2.swap_home_away(1, 2);
        assert_eq!(ev.evaluate(&s1, &a).unwrap(), ev.evaluate(&s2, &a).unwrap());
    }

    #[test]
    fn test_evaluate_incomplete_assignment() {
        let ev = setup();
        let s = Schedule::build_initial(4).unwrap();
        let mut a = Assignment::uniform(4, TransportMode::Plane);
        a.clear(2, 1);
        assert!(matches!(
            ev.evaluate(&s, &a),
            Err(LeagueError::IncompleteAssignment { home: 2, away: 1 })
        ));
    }

    #[test]
    fn test_evaluate_size_mismatch() {
        let ev = setup();
        let s = Schedule::build_initial(6).unwrap();
        let a = Assignment::uniform(4, TransportMode::Plane);
        assert!(matches!(
            ev.evaluate(&s, &a),
            Err(LeagueError::TableSizeMismatch { expected: 4, actual: 6 })
        ));
    }

    #[test]
    fn test_per_team_sums_to_total() {
        let ev = setup();
        let s = Schedule::build_initial(4).unwrap();
        let a = Assignment::uniform(4, TransportMode::Train);
        let per_team = ev.per_team(&s, &a).unwrap();
        let total: f64 = per_team.iter().map(|t| t.emissions).sum();
        let e = ev.evaluate(&s, &a).unwrap();
        assert!((total - e.total_emissions).abs() < 1e-9);
        assert!(per_team.iter().all(|t| t.trips == 3));
    }
}
