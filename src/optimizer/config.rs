//! Solver configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LeagueError;
use crate::evaluation::{BaselineSource, Objective};

/// Search strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// [`Exact`](Strategy::Exact) up to `exact_team_limit` teams, otherwise
    /// [`Annealing`](Strategy::Annealing).
    #[default]
    Auto,
    /// Depth-first branch and bound over the mode indicators.
    Exact,
    /// Simulated annealing with geometric cooling.
    Annealing,
    /// Local search accepting only non-worsening moves.
    Descent,
    /// Genetic search over week order, venues and modes.
    Genetic,
    /// Adaptive large-neighbourhood search.
    LargeNeighborhood,
}

impl Strategy {
    /// Replaces [`Auto`](Strategy::Auto) by the concrete strategy for `num_teams`.
    pub fn resolve(self, num_teams: usize, exact_team_limit: usize) -> Strategy {
        match self {
            Strategy::Auto if num_teams <= exact_team_limit => Strategy::Exact,
            Strategy::Auto => Strategy::Annealing,
            other => other,
        }
    }

    /// Returns `true` for the exact strategy.
    pub fn is_exact(self) -> bool {
        self == Strategy::Exact
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Auto => "auto",
            Strategy::Exact => "exact",
            Strategy::Annealing => "annealing",
            Strategy::Descent => "descent",
            Strategy::Genetic => "genetic",
            Strategy::LargeNeighborhood => "large-neighborhood",
        };
        f.write_str(name)
    }
}

/// Configuration of an [`Optimizer`](super::Optimizer).
///
/// All fields have defaults, so a JSON document only needs the values it
/// changes.
///
/// # Examples
///
/// ```
/// use u_league::optimizer::{SolverConfig, Strategy};
///
/// let config = SolverConfig::default()
///     .with_target(30.0)
///     .with_strategy(Strategy::Annealing)
///     .with_workers(2)
///     .with_max_iterations(5_000);
/// assert!(config.validate().is_ok());
///
/// let from_json = SolverConfig::from_json(r#"{"target_reduction": 30.0, "workers": 2}"#).unwrap();
/// assert_eq!(from_json.workers, 2);
/// assert_eq!(from_json.seed, SolverConfig::default().seed);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Search strategy.
    pub strategy: Strategy,
    /// What to minimise.
    pub objective: Objective,
    /// Reduction target `X` in percent, `0 ≤ X < 100`.
    pub target_reduction: f64,
    /// Source of the baseline `E₀`.
    pub baseline: BaselineSource,
    /// Wall-clock limit in milliseconds.
    pub time_limit_ms: Option<u64>,
    /// Iteration limit per worker.
    pub max_iterations: u64,
    /// Number of independent restarts run in parallel.
    pub workers: usize,
    /// Base seed; worker `k` uses `seed + k`.
    pub seed: u64,
    /// Largest league solved by the exact strategy under [`Strategy::Auto`].
    pub exact_team_limit: usize,
    /// Node limit of the exact strategy.
    pub exact_node_limit: u64,
    /// Starting temperature, in units of the average per-trip trade-off.
    pub initial_temperature: f64,
    /// Geometric cooling factor in `(0, 1)`.
    pub cooling_rate: f64,
    /// Temperature at which annealing reheats from its best solution.
    pub min_temperature: f64,
    /// Probability that a move changes the timetable rather than a mode.
    pub structural_move_rate: f64,
    /// Genetic population size.
    pub population_size: usize,
    /// Generations per genetic epoch.
    pub generations_per_epoch: usize,
    /// Fraction of trips removed by a destroy operator.
    pub destroy_degree: f64,
    /// Iterations per large-neighbourhood epoch.
    pub iterations_per_epoch: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Auto,
            objective: Objective::MinEmissions,
            target_reduction: 0.0,
            baseline: BaselineSource::Reference,
            time_limit_ms: None,
            max_iterations: 20_000,
            workers: 4,
            seed: 42,
            exact_team_limit: 8,
            exact_node_limit: 2_000_000,
            initial_temperature: 1.0,
            cooling_rate: 0.995,
            min_temperature: 1e-3,
            structural_move_rate: 0.3,
            population_size: 40,
            generations_per_epoch: 25,
            destroy_degree: 0.2,
            iterations_per_epoch: 200,
        }
    }
}

impl SolverConfig {
    /// Parses a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, LeagueError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the objective.
    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    /// Sets the reduction target `X` in percent.
    pub fn with_target(mut self, target: f64) -> Self {
        self.target_reduction = target;
        self
    }

    /// Sets the baseline source.
    pub fn with_baseline(mut self, baseline: BaselineSource) -> Self {
        self.baseline = baseline;
        self
    }

    /// Sets the wall-clock limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = Some(limit.as_millis().min(u64::MAX as u128) as u64);
        self
    }

    /// Sets the iteration limit per worker.
    pub fn with_max_iterations(mut self, n: u64) -> Self {
        self.max_iterations = n;
        self
    }

    /// Sets the number of parallel workers.
    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = n;
        self
    }

    /// Sets the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the largest league handled by the exact strategy under `Auto`.
    pub fn with_exact_team_limit(mut self, n: usize) -> Self {
        self.exact_team_limit = n;
        self
    }

    /// Sets the node limit of the exact strategy.
    pub fn with_exact_node_limit(mut self, n: u64) -> Self {
        self.exact_node_limit = n;
        self
    }

    /// Sets the annealing schedule.
    pub fn with_cooling(
        mut self,
        initial_temperature: f64,
        cooling_rate: f64,
        min_temperature: f64,
    ) -> Self {
        self.initial_temperature = initial_temperature;
        self.cooling_rate = cooling_rate;
        self.min_temperature = min_temperature;
        self
    }

    /// Sets the probability of a timetable move.
    pub fn with_structural_move_rate(mut self, rate: f64) -> Self {
        self.structural_move_rate = rate;
        self
    }

    /// Sets the genetic population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the generations per genetic epoch.
    pub fn with_generations_per_epoch(mut self, n: usize) -> Self {
        self.generations_per_epoch = n;
        self
    }

    /// Sets the destroy degree of the large-neighbourhood search.
    pub fn with_destroy_degree(mut self, degree: f64) -> Self {
        self.destroy_degree = degree;
        self
    }

    /// Sets the iterations per large-neighbourhood epoch.
    pub fn with_iterations_per_epoch(mut self, n: usize) -> Self {
        self.iterations_per_epoch = n;
        self
    }

    /// Wall-clock limit, if any.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    /// Rejects out-of-range values.
    pub fn validate(&self) -> Result<(), LeagueError> {
        if !(0.0..100.0).contains(&self.target_reduction) {
            return Err(LeagueError::InvalidTarget(self.target_reduction));
        }
        if let BaselineSource::External(e0) = self.baseline {
            if !e0.is_finite() || e0 <= 0.0 {
                return Err(LeagueError::InvalidBaseline(e0));
            }
        }
        let checks: [(bool, &str); 10] = [
            (self.workers >= 1, "workers must be at least 1"),
            (self.max_iterations >= 1, "max_iterations must be at least 1"),
            (self.exact_node_limit >= 1, "exact_node_limit must be at least 1"),
            (
                self.initial_temperature.is_finite() && self.initial_temperature > 0.0,
                "initial_temperature must be positive",
            ),
            (
                self.cooling_rate > 0.0 && self.cooling_rate < 1.0,
                "cooling_rate must lie in (0, 1)",
            ),
            (
                self.min_temperature > 0.0 && self.min_temperature < self.initial_temperature,
                "min_temperature must lie in (0, initial_temperature)",
            ),
            (
                (0.0..=1.0).contains(&self.structural_move_rate),
                "structural_move_rate must lie in [0, 1]",
            ),
            (self.population_size >= 2, "population_size must be at least 2"),
            (
                self.generations_per_epoch >= 1 && self.iterations_per_epoch >= 1,
                "epoch lengths must be at least 1",
            ),
            (
                self.destroy_degree > 0.0 && self.destroy_degree <= 1.0,
                "destroy_degree must lie in (0, 1]",
            ),
        ];
        match checks.iter().find(|(ok, _)| !ok) {
            Some((_, msg)) => Err(LeagueError::InvalidConfig((*msg).to_string())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransportMode;

    #[test]
    fn test_default_is_valid() {
        assert!(SolverConfig::default().validate().is_ok());
    }

    #[test]
    fn test_auto_resolution() {
        assert_eq!(Strategy::Auto.resolve(6, 8), Strategy::Exact);
        assert_eq!(Strategy::Auto.resolve(20, 8), Strategy::Annealing);
        assert_eq!(Strategy::Genetic.resolve(4, 8), Strategy::Genetic);
    }

    #[test]
    fn test_validate_target() {
        let c = SolverConfig::default().with_target(100.0);
        assert!(matches!(c.validate(), Err(LeagueError::InvalidTarget(_))));
    }

    #[test]
    fn test_validate_ranges() {
        let bad = [
            SolverConfig::default().with_workers(0),
            SolverConfig::default().with_cooling(1.0, 1.0, 0.01),
            SolverConfig::default().with_cooling(1.0, 0.9, 2.0),
            SolverConfig::default().with_structural_move_rate(1.5),
            SolverConfig::default().with_population_size(1),
            SolverConfig::default().with_destroy_degree(0.0),
            SolverConfig::default().with_baseline(BaselineSource::External(-1.0)),
        ];
        for c in bad {
            assert!(c.validate().is_err(), "{c:?}");
        }
    }

    #[test]
    fn test_from_json_partial() {
        let c = SolverConfig::from_json(
            r#"{"strategy": "genetic", "objective": "min_time_within_budget",
                "baseline": {"uniform": "plane"}, "time_limit_ms": 250}"#,
        )
        .unwrap();
        assert_eq!(c.strategy, Strategy::Genetic);
        assert_eq!(c.objective, Objective::MinTimeWithinBudget);
        assert_eq!(c.baseline, BaselineSource::Uniform(TransportMode::Plane));
        assert_eq!(c.time_limit(), Some(Duration::from_millis(250)));
        assert_eq!(c.workers, 4);
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(matches!(SolverConfig::from_json("{"), Err(LeagueError::Json(_))));
    }
}
