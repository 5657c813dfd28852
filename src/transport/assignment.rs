//! Per-fixture transport mode assignment.

use serde::{Deserialize, Serialize};

use crate::error::LeagueError;
use crate::models::TransportMode;
use crate::params::ParameterTable;

/// Transport mode chosen for each ordered `(home, away)` pairing.
///
/// In a double round-robin every ordered pairing is exactly one fixture,
/// so keying by the pairing attaches the mode to the fixture itself and
/// the choice survives week moves of the timetable.
///
/// # Examples
///
/// ```
/// use u_league::models::TransportMode;
/// use u_league::transport::Assignment;
///
/// let mut a = Assignment::uniform(4, TransportMode::Plane);
/// assert!(a.is_complete());
/// a.set(0, 1, TransportMode::Train);
/// assert_eq!(a.mode(0, 1), Some(TransportMode::Train));
/// assert_eq!(a.count(TransportMode::Train), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment {
    num_teams: usize,
    modes: Vec<Option<TransportMode>>,
}

impl Assignment {
    /// Creates an assignment with no mode chosen yet.
    pub fn new(num_teams: usize) -> Self {
        Self {
            num_teams,
            modes: vec![None; num_teams * num_teams],
        }
    }

    /// Creates a complete assignment using `mode` for every trip.
    pub fn uniform(num_teams: usize, mode: TransportMode) -> Self {
        Self::from_fn(num_teams, |_, _| mode)
    }

    /// Creates a complete assignment by calling `f(home, away)` per pairing.
    pub fn from_fn<F>(num_teams: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> TransportMode,
    {
        let mut a = Self::new(num_teams);
        for home in 0..num_teams {
            for away in 0..num_teams {
                if home != away {
                    a.modes[home * num_teams + away] = Some(f(home, away));
                }
            }
        }
        a
    }

    /// Number of teams.
    pub fn num_teams(&self) -> usize {
        self.num_teams
    }

    /// Mode chosen for `(home, away)`, if any.
    pub fn mode(&self, home: usize, away: usize) -> Option<TransportMode> {
        if home >= self.num_teams || away >= self.num_teams {
            return None;
        }
        self.modes[home * self.num_teams + away]
    }

    /// Chooses `mode` for `(home, away)`.
    ///
    /// # Panics
    ///
    /// Panics if a team is out of range or `home == away`.
    pub fn set(&mut self, home: usize, away: usize, mode: TransportMode) {
        assert!(
            home < self.num_teams && away < self.num_teams && home != away,
            "called `Assignment::set()` with invalid pairing ({home}, {away})"
        );
        self.modes[home * self.num_teams + away] = Some(mode);
    }

    /// Removes the mode of `(home, away)` and returns it.
    pub fn clear(&mut self, home: usize, away: usize) -> Option<TransportMode> {
        if home >= self.num_teams || away >= self.num_teams {
            return None;
        }
        self.modes[home * self.num_teams + away].take()
    }

    /// Switches `(home, away)` to the other mode and returns the new mode.
    ///
    /// Returns `None` if no mode was chosen for the pairing.
    pub fn flip(&mut self, home: usize, away: usize) -> Option<TransportMode> {
        if home >= self.num_teams || away >= self.num_teams {
            return None;
        }
        let slot = &mut self.modes[home * self.num_teams + away];
        *slot = slot.map(TransportMode::other);
        *slot
    }

    /// Returns `true` if every off-diagonal pairing has exactly one mode.
    pub fn is_complete(&self) -> bool {
        self.first_missing().is_none()
    }

    /// First pairing (row-major) without a mode.
    pub fn first_missing(&self) -> Option<(usize, usize)> {
        self.pairs().find_map(|(h, a, m)| match m {
            None => Some((h, a)),
            Some(_) => None,
        })
    }

    /// Pairings currently without a mode.
    pub fn missing(&self) -> Vec<(usize, usize)> {
        self.pairs()
            .filter(|(_, _, m)| m.is_none())
            .map(|(h, a, _)| (h, a))
            .collect()
    }

    /// Number of pairings assigned to `mode`.
    pub fn count(&self, mode: TransportMode) -> usize {
        self.modes.iter().filter(|m| **m == Some(mode)).count()
    }

    /// Iterates over every off-diagonal `(home, away, mode)` in row-major order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize, Option<TransportMode>)> + '_ {
        let n = self.num_teams;
        self.modes
            .iter()
            .enumerate()
            .filter(move |(idx, _)| idx / n != idx % n)
            .map(move |(idx, m)| (idx / n, idx % n, *m))
    }

    /// Compact row-major encoding (0 = none, 1 = plane, 2 = train).
    pub fn encoding(&self) -> Vec<u8> {
        self.modes
            .iter()
            .map(|m| match m {
                None => 0,
                Some(TransportMode::Plane) => 1,
                Some(TransportMode::Train) => 2,
            })
            .collect()
    }

    /// Total emissions and time, summed in row-major pairing order.
    ///
    /// The fixed summation order makes totals bit-identical for identical
    /// assignments, whatever the week layout of the timetable.
    pub fn totals(&self, table: &ParameterTable) -> Result<(f64, f64), LeagueError> {
        let mut emissions = 0.0;
        let mut time = 0.0;
        for (home, away, mode) in self.pairs() {
            let mode = mode.ok_or(LeagueError::IncompleteAssignment { home, away })?;
            let option = table
                .get(home, away)
                .ok_or(LeagueError::MissingTravelOption { home, away })?;
            emissions += option.emission(mode);
            time += option.time(mode);
        }
        Ok((emissions, time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::TravelOption;

    #[test]
    fn test_new_is_empty() {
        let a = Assignment::new(4);
        assert!(!a.is_complete());
        assert_eq!(a.first_missing(), Some((0, 1)));
        assert_eq!(a.missing().len(), 12);
        assert_eq!(a.count(TransportMode::Plane), 0);
    }

    #[test]
    fn test_uniform_is_complete() {
        let a = Assignment::uniform(4, TransportMode::Train);
        assert!(a.is_complete());
        assert_eq!(a.count(TransportMode::Train), 12);
        assert_eq!(a.mode(2, 2), None);
    }

    #[test]
    fn test_flip_and_clear() {
        let mut a = Assignment::uniform(4, TransportMode::Plane);
        assert_eq!(a.flip(1, 2), Some(TransportMode::Train));
        assert_eq!(a.flip(1, 2), Some(TransportMode::Plane));
        assert_eq!(a.clear(1, 2), Some(TransportMode::Plane));
        assert_eq!(a.flip(1, 2), None);
        assert_eq!(a.first_missing(), Some((1, 2)));
    }

    #[test]
    #[should_panic(expected = "invalid pairing")]
    fn test_set_diagonal_panics() {
        let mut a = Assignment::new(4);
        a.set(2, 2, TransportMode::Plane);
    }

    #[test]
    fn test_encoding_distinguishes_modes() {
        let a = Assignment::uniform(2, TransportMode::Plane);
        let b = Assignment::uniform(2, TransportMode::Train);
        assert_eq!(a.encoding(), vec![0, 1, 1, 0]);
        assert!(a.encoding() < b.encoding());
    }

    #[test]
    fn test_totals() {
        let table = ParameterTable::from_fn(2, |_, _| TravelOption::new(10.0, 1.0, 2.0, 5.0))
            .unwrap();
        let mut a = Assignment::uniform(2, TransportMode::Plane);
        a.set(1, 0, TransportMode::Train);
        let (e, t) = a.totals(&table).unwrap();
        assert!((e - 11.0).abs() < 1e-12);
        assert!((t - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_totals_incomplete() {
        let table = ParameterTable::from_fn(2, |_, _| TravelOption::new(10.0, 1.0, 2.0, 5.0))
            .unwrap();
        let mut a = Assignment::uniform(2, TransportMode::Plane);
        a.clear(0, 1);
        assert!(matches!(
            a.totals(&table),
            Err(LeagueError::IncompleteAssignment { home: 0, away: 1 })
        ));
    }
}
