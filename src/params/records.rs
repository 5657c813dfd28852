//! Tabular input formats for the parameter table.
//!
//! Two shapes are accepted:
//!
//! - [`TravelRecord`]: one row per ordered `(home, away)` pair carrying the
//!   four round-trip values directly.
//! - [`RouteLeg`]: one row per one-way leg and mode, as produced by the
//!   route-computation pipeline (`departure`, `arrival`, `transport`,
//!   `emissions_kg_co2`, `travel_time_seconds`). The round trip of the away
//!   team is the outbound leg `away → home` plus the return leg
//!   `home → away`; when one direction is missing the reverse direction is
//!   used in its place.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::table::{ParameterTable, TravelOption};
use crate::error::LeagueError;
use crate::models::{TeamSet, TransportMode};

/// One row of round-trip parameters for an ordered pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelRecord {
    /// Hosting team name.
    pub home: String,
    /// Travelling team name.
    pub away: String,
    /// Round-trip emissions by plane.
    pub emission_plane: f64,
    /// Round-trip emissions by train.
    pub emission_train: f64,
    /// Round-trip duration by plane.
    pub time_plane: f64,
    /// Round-trip duration by train.
    pub time_train: f64,
}

/// One computed one-way leg for a single mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    /// Departure team name.
    pub departure: String,
    /// Arrival team name.
    pub arrival: String,
    /// Mode used on this leg.
    pub transport: TransportMode,
    /// Emissions of the leg.
    pub emissions_kg_co2: f64,
    /// Duration of the leg.
    pub travel_time_seconds: f64,
}

impl ParameterTable {
    /// Builds a table from per-pair records and checks completeness.
    ///
    /// Later records for the same ordered pair replace earlier ones.
    pub fn from_records(teams: &TeamSet, records: &[TravelRecord]) -> Result<Self, LeagueError> {
        let mut table = Self::new(teams.len());
        for record in records {
            let home = teams.require(&record.home)?;
            let away = teams.require(&record.away)?;
            table.set(
                home,
                away,
                TravelOption::new(
                    record.emission_plane,
                    record.emission_train,
                    record.time_plane,
                    record.time_train,
                ),
            )?;
        }
        table.validate_for(teams.len())?;
        Ok(table)
    }

    /// Parses a JSON array of [`TravelRecord`]s.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_league::models::TeamSet;
    /// use u_league::params::ParameterTable;
    ///
    /// let teams = TeamSet::new(["A", "B"]).unwrap();
    /// let json = r#"[
    ///   {"home": "A", "away": "B", "emission_plane": 90.0, "emission_train": 12.0,
    ///    "time_plane": 3600.0, "time_train": 9000.0},
    ///   {"home": "B", "away": "A", "emission_plane": 90.0, "emission_train": 12.0,
    ///    "time_plane": 3600.0, "time_train": 9000.0}
    /// ]"#;
    /// let table = ParameterTable::from_json(&teams, json).unwrap();
    /// assert_eq!(table.option(0, 1).emission_train, 12.0);
    /// ```
    pub fn from_json(teams: &TeamSet, json: &str) -> Result<Self, LeagueError> {
        let records: Vec<TravelRecord> = serde_json::from_str(json)?;
        Self::from_records(teams, &records)
    }

    /// Builds a table from one-way legs, deriving each round trip.
    pub fn from_route_legs(teams: &TeamSet, legs: &[RouteLeg]) -> Result<Self, LeagueError> {
        let mut by_leg: HashMap<(usize, usize, TransportMode), (f64, f64)> = HashMap::new();
        for leg in legs {
            let from = teams.require(&leg.departure)?;
            let to = teams.require(&leg.arrival)?;
            if from == to {
                return Err(LeagueError::SelfTravel(from));
            }
            by_leg.insert(
                (from, to, leg.transport),
                (leg.emissions_kg_co2, leg.travel_time_seconds),
            );
        }

        let lookup = |from: usize, to: usize, mode: TransportMode| {
            by_leg
                .get(&(from, to, mode))
                .or_else(|| by_leg.get(&(to, from, mode)))
                .copied()
        };

        let n = teams.len();
        let mut table = Self::new(n);
        for home in 0..n {
            for away in 0..n {
                if home == away {
                    continue;
                }
                let mut emission = [0.0; 2];
                let mut time = [0.0; 2];
                for (slot, mode) in TransportMode::ALL.into_iter().enumerate() {
                    let outbound = lookup(away, home, mode);
                    let inbound = lookup(home, away, mode);
                    match (outbound, inbound) {
                        (Some((e1, t1)), Some((e2, t2))) => {
                            emission[slot] = e1 + e2;
                            time[slot] = t1 + t2;
                        }
                        _ => return Err(LeagueError::MissingTravelOption { home, away }),
                    }
                }
                table.set(
                    home,
                    away,
                    TravelOption::new(emission[0], emission[1], time[0], time[1]),
                )?;
            }
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teams() -> TeamSet {
        TeamSet::new(["A", "B"]).unwrap()
    }

    fn record(home: &str, away: &str) -> TravelRecord {
        TravelRecord {
            home: home.into(),
            away: away.into(),
            emission_plane: 50.0,
            emission_train: 5.0,
            time_plane: 2.0,
            time_train: 6.0,
        }
    }

    fn leg(dep: &str, arr: &str, mode: TransportMode, e: f64, t: f64) -> RouteLeg {
        RouteLeg {
            departure: dep.into(),
            arrival: arr.into(),
            transport: mode,
            emissions_kg_co2: e,
            travel_time_seconds: t,
        }
    }

    #[test]
    fn test_from_records() {
        let table =
            ParameterTable::from_records(&teams(), &[record("A", "B"), record("B", "A")]).unwrap();
        assert_eq!(table.option(1, 0).time_train, 6.0);
    }

    #[test]
    fn test_from_records_missing_pair() {
        let err = ParameterTable::from_records(&teams(), &[record("A", "B")]).unwrap_err();
        assert!(matches!(
            err,
            LeagueError::MissingTravelOption { home: 1, away: 0 }
        ));
    }

    #[test]
    fn test_from_records_unknown_team() {
        let err = ParameterTable::from_records(&teams(), &[record("A", "Z")]).unwrap_err();
        assert!(matches!(err, LeagueError::UnknownTeam(ref t) if t == "Z"));
    }

    #[test]
    fn test_from_json_malformed() {
        let err = ParameterTable::from_json(&teams(), "{not json").unwrap_err();
        assert!(matches!(err, LeagueError::Json(_)));
    }

    #[test]
    fn test_route_legs_round_trip() {
        let legs = vec![
            leg("A", "B", TransportMode::Plane, 40.0, 1.0),
            leg("B", "A", TransportMode::Plane, 45.0, 1.5),
            leg("A", "B", TransportMode::Train, 4.0, 3.0),
            leg("B", "A", TransportMode::Train, 5.0, 3.5),
        ];
        let table = ParameterTable::from_route_legs(&teams(), &legs).unwrap();
        // B travels to A: outbound B→A + return A→B
        let o = table.option(0, 1);
        assert!((o.emission_plane - 85.0).abs() < 1e-10);
        assert!((o.time_train - 6.5).abs() < 1e-10);
        assert_eq!(table.option(1, 0), o);
    }

    #[test]
    fn test_route_legs_reverse_fallback() {
        let legs = vec![
            leg("A", "B", TransportMode::Plane, 40.0, 1.0),
            leg("B", "A", TransportMode::Train, 5.0, 3.0),
        ];
        let table = ParameterTable::from_route_legs(&teams(), &legs).unwrap();
        let o = table.option(1, 0);
        assert!((o.emission_plane - 80.0).abs() < 1e-10);
        assert!((o.emission_train - 10.0).abs() < 1e-10);
        assert!((o.time_train - 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_route_legs_missing_mode() {
        let legs = vec![leg("A", "B", TransportMode::Plane, 40.0, 1.0)];
        let err = ParameterTable::from_route_legs(&teams(), &legs).unwrap_err();
        assert!(matches!(err, LeagueError::MissingTravelOption { .. }));
    }

    #[test]
    fn test_route_legs_reject_self_travel() {
        let legs = vec![leg("A", "A", TransportMode::Plane, 40.0, 1.0)];
        assert!(matches!(
            ParameterTable::from_route_legs(&teams(), &legs),
            Err(LeagueError::SelfTravel(0))
        ));
    }
}
