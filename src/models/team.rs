//! Team set.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::LeagueError;

/// An ordered, duplicate-free list of team identifiers.
///
/// Every other component addresses teams by their index in this list
/// (`0..len()`); names only matter at the input/output boundary.
///
/// # Examples
///
/// ```
/// use u_league::models::TeamSet;
///
/// let teams = TeamSet::new(["Lyon", "Paris", "Lille", "Nice"]).unwrap();
/// assert_eq!(teams.len(), 4);
/// assert_eq!(teams.index_of("Lille"), Some(2));
/// assert_eq!(teams.name(1), "Paris");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct TeamSet {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl TeamSet {
    /// Creates a team set, rejecting duplicate names.
    ///
    /// The size is not checked here;
    /// [`Schedule::build_initial`](crate::schedule::Schedule::build_initial) enforces the
    /// even-size requirement.
    pub fn new<I, S>(names: I) -> Result<Self, LeagueError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(LeagueError::DuplicateTeam(name.clone()));
            }
        }
        Ok(Self { names, index })
    }

    /// Number of teams.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if there are no teams.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Index of the team with the given name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Index of the team with the given name, or [`LeagueError::UnknownTeam`].
    pub fn require(&self, name: &str) -> Result<usize, LeagueError> {
        self.index_of(name)
            .ok_or_else(|| LeagueError::UnknownTeam(name.to_string()))
    }

    /// Name of the team at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    /// All team names in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl TryFrom<Vec<String>> for TeamSet {
    type Error = LeagueError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<TeamSet> for Vec<String> {
    fn from(teams: TeamSet) -> Self {
        teams.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_set_lookup() {
        let teams = TeamSet::new(["A", "B", "C", "D"]).unwrap();
        assert_eq!(teams.len(), 4);
        assert!(!teams.is_empty());
        assert_eq!(teams.index_of("C"), Some(2));
        assert_eq!(teams.index_of("Z"), None);
        assert_eq!(teams.name(3), "D");
        assert_eq!(teams.require("A").unwrap(), 0);
    }

    #[test]
    fn test_team_set_rejects_duplicates() {
        let err = TeamSet::new(["A", "B", "A"]).unwrap_err();
        assert!(matches!(err, LeagueError::DuplicateTeam(ref name) if name == "A"));
    }

    #[test]
    fn test_unknown_team() {
        let teams = TeamSet::new(["A", "B"]).unwrap();
        assert!(matches!(
            teams.require("C"),
            Err(LeagueError::UnknownTeam(_))
        ));
    }

    #[test]
    fn test_team_set_serde() {
        let teams = TeamSet::new(["A", "B"]).unwrap();
        let json = serde_json::to_string(&teams).unwrap();
        assert_eq!(json, r#"["A","B"]"#);
        let back: TeamSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back.index_of("B"), Some(1));

        let dup: Result<TeamSet, _> = serde_json::from_str(r#"["A","A"]"#);
        assert!(dup.is_err());
    }
}
