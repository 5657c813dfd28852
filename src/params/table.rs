//! Dense per-ordered-pair travel parameter table.

use serde::{Deserialize, Serialize};

use crate::error::LeagueError;
use crate::models::TransportMode;

/// Round-trip parameters of the away team visiting a host, per mode.
///
/// Emissions are in kg CO₂ and times in seconds, but nothing in the
/// crate depends on the units as long as they are used consistently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TravelOption {
    /// Emissions of the round trip by plane.
    pub emission_plane: f64,
    /// Emissions of the round trip by train.
    pub emission_train: f64,
    /// Duration of the round trip by plane.
    pub time_plane: f64,
    /// Duration of the round trip by train.
    pub time_train: f64,
}

impl TravelOption {
    /// Creates a travel option.
    pub fn new(emission_plane: f64, emission_train: f64, time_plane: f64, time_train: f64) -> Self {
        Self {
            emission_plane,
            emission_train,
            time_plane,
            time_train,
        }
    }

    /// Emissions of the round trip by `mode`.
    pub fn emission(&self, mode: TransportMode) -> f64 {
        match mode {
            TransportMode::Plane => self.emission_plane,
            TransportMode::Train => self.emission_train,
        }
    }

    /// Duration of the round trip by `mode`.
    pub fn time(&self, mode: TransportMode) -> f64 {
        match mode {
            TransportMode::Plane => self.time_plane,
            TransportMode::Train => self.time_train,
        }
    }

    /// Rejects negative or non-finite values.
    pub fn check(&self, home: usize, away: usize) -> Result<(), LeagueError> {
        let fields = [
            ("emission_plane", self.emission_plane),
            ("emission_train", self.emission_train),
            ("time_plane", self.time_plane),
            ("time_train", self.time_train),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(LeagueError::InvalidParameter {
                    home,
                    away,
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Immutable lookup of [`TravelOption`]s keyed by ordered `(home, away)`.
///
/// Stored as a dense `n × n` grid in row-major order; the diagonal is
/// never populated because a team never travels to itself.
///
/// # Examples
///
/// ```
/// use u_league::params::{ParameterTable, TravelOption};
///
/// let table = ParameterTable::from_fn(4, |home, away| {
///     let d = (home as f64 - away as f64).abs();
///     TravelOption::new(10.0 * d, 2.0 * d, 1.0 * d, 4.0 * d)
/// })
/// .unwrap();
/// assert_eq!(table.size(), 4);
/// assert!(table.validate_for(4).is_ok());
/// assert_eq!(table.option(0, 2).emission_train, 4.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterTable {
    options: Vec<Option<TravelOption>>,
    size: usize,
}

impl ParameterTable {
    /// Creates an empty table for `size` teams.
    pub fn new(size: usize) -> Self {
        Self {
            options: vec![None; size * size],
            size,
        }
    }

    /// Builds a complete table by calling `f(home, away)` for every ordered pair.
    pub fn from_fn<F>(size: usize, mut f: F) -> Result<Self, LeagueError>
    where
        F: FnMut(usize, usize) -> TravelOption,
    {
        let mut table = Self::new(size);
        for home in 0..size {
            for away in 0..size {
                if home != away {
                    table.set(home, away, f(home, away))?;
                }
            }
        }
        Ok(table)
    }

    /// Stores the option for `(home, away)`, replacing any previous entry.
    pub fn set(
        &mut self,
        home: usize,
        away: usize,
        option: TravelOption,
    ) -> Result<(), LeagueError> {
        if home >= self.size || away >= self.size {
            return Err(LeagueError::TableSizeMismatch {
                expected: self.size,
                actual: home.max(away) + 1,
            });
        }
        if home == away {
            return Err(LeagueError::SelfTravel(home));
        }
        option.check(home, away)?;
        self.options[home * self.size + away] = Some(option);
        Ok(())
    }

    /// Returns the option for `(home, away)` if present.
    pub fn get(&self, home: usize, away: usize) -> Option<&TravelOption> {
        if home >= self.size || away >= self.size {
            return None;
        }
        self.options[home * self.size + away].as_ref()
    }

    /// Returns the option for `(home, away)`.
    ///
    /// # Panics
    ///
    /// Panics if the entry is missing. Call [`validate_for`](Self::validate_for)
    /// once before using this on the search hot path.
    pub fn option(&self, home: usize, away: usize) -> &TravelOption {
        match self.get(home, away) {
            Some(option) => option,
            None => panic!("no travel option for home {home} / away {away}"),
        }
    }

    /// Number of teams covered by this table.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Checks that every ordered pair of `num_teams` teams has an entry.
    pub fn validate_for(&self, num_teams: usize) -> Result<(), LeagueError> {
        if self.size != num_teams {
            return Err(LeagueError::TableSizeMismatch {
                expected: num_teams,
                actual: self.size,
            });
        }
        for home in 0..self.size {
            for away in 0..self.size {
                if home != away && self.get(home, away).is_none() {
                    return Err(LeagueError::MissingTravelOption { home, away });
                }
            }
        }
        Ok(())
    }

    /// Iterates over every populated `(home, away, option)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &TravelOption)> + '_ {
        self.options.iter().enumerate().filter_map(move |(idx, opt)| {
            opt.as_ref()
                .map(|option| (idx / self.size, idx % self.size, option))
        })
    }

    /// Sum over all pairs of the lowest-emission mode.
    ///
    /// Every ordered pair is played exactly once in a double round-robin,
    /// so this is the minimum total any season can reach.
    pub fn min_total_emissions(&self) -> f64 {
        self.iter()
            .map(|(_, _, o)| o.emission_plane.min(o.emission_train))
            .sum()
    }

    /// Returns `true` if the table is symmetric within the given tolerance.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        for home in 0..self.size {
            for away in (home + 1)..self.size {
                match (self.get(home, away), self.get(away, home)) {
                    (Some(a), Some(b)) => {
                        let pairs = [
                            (a.emission_plane, b.emission_plane),
                            (a.emission_train, b.emission_train),
                            (a.time_plane, b.time_plane),
                            (a.time_train, b.time_train),
                        ];
                        if pairs.iter().any(|(x, y)| (x - y).abs() > tol) {
                            return false;
                        }
                    }
                    (None, None) => {}
                    _ => return false,
                }
            }
        }
        true
    }
}
