//! Fixture type.

use serde::{Deserialize, Serialize};

use super::TeamSet;

/// One scheduled match: `home` hosts `away` in `week`.
///
/// Only the away team travels; its round trip is described by the
/// parameter table entry for `(home, away)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fixture {
    /// Hosting team index.
    pub home: usize,
    /// Travelling team index.
    pub away: usize,
    /// Week index (`0..2·(N−1)`).
    pub week: usize,
}

impl Fixture {
    /// Creates a fixture.
    pub fn new(home: usize, away: usize, week: usize) -> Self {
        Self { home, away, week }
    }

    /// Returns `true` if `team` plays in this fixture.
    pub fn involves(&self, team: usize) -> bool {
        self.home == team || self.away == team
    }

    /// Renders the fixture with team names.
    ///
    /// # Panics
    ///
    /// Panics if a team index is outside `teams`.
    pub fn describe(&self, teams: &TeamSet) -> String {
        format!(
            "week {}: {} vs {}",
            self.week + 1,
            teams.name(self.home),
            teams.name(self.away)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_involves() {
        let f = Fixture::new(0, 3, 5);
        assert!(f.involves(0));
        assert!(f.involves(3));
        assert!(!f.involves(1));
    }

    #[test]
    fn test_describe() {
        let teams = TeamSet::new(["Lyon", "Paris"]).unwrap();
        let f = Fixture::new(1, 0, 0);
        assert_eq!(f.describe(&teams), "week 1: Paris vs Lyon");
    }
}
