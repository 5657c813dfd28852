//! Double round-robin timetable.
//!
//! # Construction
//!
//! [`Schedule::build_initial`] uses the polygon (circle) method: team
//! `N−1` is fixed at the centre and teams `0..N−1` rotate around it. In
//! round `r` the fixed team meets `r`, and for `i = 1..N/2` team
//! `(r + i) mod (N−1)` meets `(r − i) mod (N−1)`. Rounds `0..N−1` form a
//! single round-robin; weeks `N−1..2(N−1)` repeat them with venues swapped.
//!
//! # Moves
//!
//! Both move operators map valid timetables to valid timetables and are
//! involutions, so a rejected move is undone by applying it again:
//!
//! - [`Schedule::swap_weeks`]: permutes two whole weeks
//! - [`Schedule::swap_home_away`]: exchanges the venues of the two
//!   meetings between a pair of teams, keeping their weeks
//!
//! # Reference
//!
//! de Werra, D. (1981). "Scheduling in sports", *Annals of Discrete
//! Mathematics* 11, 381-395.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::violation::ScheduleViolation;
use crate::error::LeagueError;
use crate::models::Fixture;

/// A single meeting within a week: `home` hosts `away`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Meeting {
    /// Hosting team index.
    pub home: usize,
    /// Travelling team index.
    pub away: usize,
}

impl Meeting {
    /// Creates a meeting.
    pub fn new(home: usize, away: usize) -> Self {
        Self { home, away }
    }

    /// The same pairing with venues swapped.
    pub fn mirrored(self) -> Self {
        Self {
            home: self.away,
            away: self.home,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ScheduleData {
    num_teams: usize,
    weeks: Vec<Vec<Meeting>>,
}

/// A season timetable: for every week, the list of meetings.
///
/// Alongside the weeks the schedule keeps an index from each ordered
/// pairing to the week it is played in. The move operators keep that
/// index in sync; [`validate`](Self::validate) re-derives everything from
/// the raw weeks.
///
/// # Examples
///
/// ```
/// use u_league::schedule::Schedule;
///
/// let mut schedule = Schedule::build_initial(6).unwrap();
/// assert_eq!(schedule.num_weeks(), 10);
/// assert_eq!(schedule.fixtures().len(), 30);
///
/// schedule.swap_weeks(0, 7);
/// assert!(schedule.swap_home_away(2, 4));
/// assert!(schedule.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ScheduleData", into = "ScheduleData")]
pub struct Schedule {
    num_teams: usize,
    weeks: Vec<Vec<Meeting>>,
    week_of: Vec<Option<usize>>,
}

impl Schedule {
    /// Number of weeks of a double round-robin for `num_teams` teams.
    pub fn expected_weeks(num_teams: usize) -> usize {
        2 * num_teams.saturating_sub(1)
    }

    /// Builds a valid double round-robin by the circle method.
    ///
    /// Fails only if `num_teams` is odd or smaller than two.
    pub fn build_initial(num_teams: usize) -> Result<Self, LeagueError> {
        if num_teams < 2 || num_teams % 2 != 0 {
            return Err(LeagueError::InvalidTeamCount { count: num_teams });
        }

        let n = num_teams;
        let m = n - 1;
        let mut first_half = Vec::with_capacity(m);
        for r in 0..m {
            let mut week = Vec::with_capacity(n / 2);
            // Alternate the fixed team's venue to keep its pattern balanced
            week.push(if r % 2 == 0 {
                Meeting::new(r, m)
            } else {
                Meeting::new(m, r)
            });
            for i in 1..n / 2 {
                let x = (r + i) % m;
                let y = (r + m - i) % m;
                week.push(if i % 2 == 1 {
                    Meeting::new(y, x)
                } else {
                    Meeting::new(x, y)
                });
            }
            first_half.push(week);
        }

        let second_half: Vec<Vec<Meeting>> = first_half
            .iter()
            .map(|week| week.iter().map(|m| m.mirrored()).collect())
            .collect();

        let mut weeks = first_half;
        weeks.extend(second_half);
        Ok(Self::from_weeks(n, weeks))
    }

    /// Wraps externally supplied weeks without checking them.
    ///
    /// Call [`validate`](Self::validate) before trusting the result.
    pub fn from_weeks(num_teams: usize, weeks: Vec<Vec<Meeting>>) -> Self {
        let mut schedule = Self {
            num_teams,
            weeks,
            week_of: vec![None; num_teams * num_teams],
        };
        schedule.rebuild_index();
        schedule
    }

    fn rebuild_index(&mut self) {
        let n = self.num_teams;
        self.week_of = vec![None; n * n];
        for (w, week) in self.weeks.iter().enumerate() {
            for m in week {
                if m.home < n && m.away < n {
                    self.week_of[m.home * n + m.away] = Some(w);
                }
            }
        }
    }

    /// Number of teams.
    pub fn num_teams(&self) -> usize {
        self.num_teams
    }

    /// Number of weeks.
    pub fn num_weeks(&self) -> usize {
        self.weeks.len()
    }

    /// Meetings of week `w`.
    ///
    /// # Panics
    ///
    /// Panics if `w` is out of bounds.
    pub fn week(&self, w: usize) -> &[Meeting] {
        &self.weeks[w]
    }

    /// All weeks in order.
    pub fn weeks(&self) -> &[Vec<Meeting>] {
        &self.weeks
    }

    /// Week in which `home` hosts `away`, if scheduled.
    pub fn week_of(&self, home: usize, away: usize) -> Option<usize> {
        if home >= self.num_teams || away >= self.num_teams {
            return None;
        }
        self.week_of[home * self.num_teams + away]
    }

    /// The full fixture list, ordered by week.
    pub fn fixtures(&self) -> Vec<Fixture> {
        self.weeks
            .iter()
            .enumerate()
            .flat_map(|(w, week)| week.iter().map(move |m| Fixture::new(m.home, m.away, w)))
            .collect()
    }

    /// Exchanges all meetings of weeks `w1` and `w2`.
    ///
    /// # Panics
    ///
    /// Panics if either week is out of bounds.
    pub fn swap_weeks(&mut self, w1: usize, w2: usize) {
        if w1 == w2 {
            // Bounds are still enforced for a no-op swap
            let _ = &self.weeks[w1];
            return;
        }
        self.weeks.swap(w1, w2);
        let n = self.num_teams;
        for w in [w1, w2] {
            for m in &self.weeks[w] {
                if m.home < n && m.away < n {
                    self.week_of[m.home * n + m.away] = Some(w);
                }
            }
        }
    }

    /// Exchanges which of `i` and `j` hosts the other, keeping both weeks.
    ///
    /// The meeting "i hosts j" becomes "j hosts i" in the same week and
    /// vice versa. Returns `false` (and changes nothing) if `i == j`, a
    /// team is out of range, or either meeting is not scheduled.
    pub fn swap_home_away(&mut self, i: usize, j: usize) -> bool {
        if i == j {
            return false;
        }
        let (wa, wb) = match (self.week_of(i, j), self.week_of(j, i)) {
            (Some(wa), Some(wb)) => (wa, wb),
            _ => return false,
        };
        let ia = self.weeks[wa]
            .iter()
            .position(|m| m.home == i && m.away == j);
        let ib = self.weeks[wb]
            .iter()
            .position(|m| m.home == j && m.away == i);
        let (ia, ib) = match (ia, ib) {
            (Some(ia), Some(ib)) => (ia, ib),
            _ => return false,
        };

        self.weeks[wa][ia] = Meeting::new(j, i);
        self.weeks[wb][ib] = Meeting::new(i, j);
        let n = self.num_teams;
        self.week_of[j * n + i] = Some(wa);
        self.week_of[i * n + j] = Some(wb);
        true
    }

    /// Applies `moves` random week swaps and venue swaps.
    ///
    /// Used to give independent search workers different starting timetables.
    pub fn perturb<R: Rng>(&mut self, rng: &mut R, moves: usize) {
        let weeks = self.num_weeks();
        let n = self.num_teams;
        if weeks < 2 || n < 2 {
            return;
        }
        for _ in 0..moves {
            if rng.random_bool(0.5) {
                let w1 = rng.random_range(0..weeks);
                let w2 = rng.random_range(0..weeks);
                self.swap_weeks(w1, w2);
            } else {
                let i = rng.random_range(0..n);
                let j = rng.random_range(0..n);
                self.swap_home_away(i, j);
            }
        }
    }

    /// Venue per week for `team`: `Some(true)` at home, `Some(false)` away.
    pub fn venue_pattern(&self, team: usize) -> Vec<Option<bool>> {
        self.weeks
            .iter()
            .map(|week| {
                week.iter().find_map(|m| {
                    if m.home == team {
                        Some(true)
                    } else if m.away == team {
                        Some(false)
                    } else {
                        None
                    }
                })
            })
            .collect()
    }

    /// Number of breaks: consecutive weeks in which a team keeps the same venue.
    pub fn breaks(&self) -> usize {
        let n = self.num_teams;
        let mut previous: Vec<Option<bool>> = vec![None; n];
        let mut breaks = 0;
        for week in &self.weeks {
            let mut current: Vec<Option<bool>> = vec![None; n];
            for m in week {
                if m.home < n {
                    current[m.home] = Some(true);
                }
                if m.away < n {
                    current[m.away] = Some(false);
                }
            }
            breaks += previous
                .iter()
                .zip(&current)
                .filter(|(p, c)| p.is_some() && p == c)
                .count();
            previous = current;
        }
        breaks
    }

    /// Canonical encoding: week by week, meetings sorted within each week.
    ///
    /// Two schedules with the same fixtures in the same weeks have the
    /// same encoding regardless of meeting order inside a week.
    pub fn encoding(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::with_capacity(self.num_teams * self.num_teams);
        for week in &self.weeks {
            let mut sorted: Vec<(usize, usize)> = week.iter().map(|m| (m.home, m.away)).collect();
            sorted.sort_unstable();
            out.extend(sorted);
        }
        out
    }

    /// Re-derives every timetable invariant from the raw weeks.
    ///
    /// Checks, in order: week count; per week that every meeting uses
    /// known, distinct teams and that every team plays exactly once; that
    /// every ordered pairing occurs exactly once; and that the pairing
    /// index agrees with the weeks. Returns the first violation found.
    pub fn validate(&self) -> Result<(), ScheduleViolation> {
        let n = self.num_teams;
        let expected = Self::expected_weeks(n);
        if self.weeks.len() != expected {
            return Err(ScheduleViolation::WeekCount {
                expected,
                actual: self.weeks.len(),
            });
        }

        let mut count = vec![0usize; n * n];
        for (w, week) in self.weeks.iter().enumerate() {
            let mut seen = vec![false; n];
            for m in week {
                for team in [m.home, m.away] {
                    if team >= n {
                        return Err(ScheduleViolation::UnknownTeam { week: w, team });
                    }
                }
                if m.home == m.away {
                    return Err(ScheduleViolation::SelfPlay {
                        week: w,
                        team: m.home,
                    });
                }
                for team in [m.home, m.away] {
                    if seen[team] {
                        return Err(ScheduleViolation::PlaysTwice { team, week: w });
                    }
                    seen[team] = true;
                }
                count[m.home * n + m.away] += 1;
            }
            if let Some(team) = seen.iter().position(|&s| !s) {
                return Err(ScheduleViolation::Idle { team, week: w });
            }
        }

        for home in 0..n {
            for away in 0..n {
                if home == away {
                    continue;
                }
                match count[home * n + away] {
                    0 => return Err(ScheduleViolation::PairingMissing { home, away }),
                    1 => {}
                    c => {
                        return Err(ScheduleViolation::PairingRepeated {
                            home,
                            away,
                            count: c,
                        })
                    }
                }
            }
        }

        for (w, week) in self.weeks.iter().enumerate() {
            for m in week {
                if self.week_of[m.home * n + m.away] != Some(w) {
                    return Err(ScheduleViolation::StaleIndex {
                        home: m.home,
                        away: m.away,
                    });
                }
            }
        }

        Ok(())
    }
}

impl From<ScheduleData> for Schedule {
    fn from(data: ScheduleData) -> Self {
        Schedule::from_weeks(data.num_teams, data.weeks)
    }
}

impl From<Schedule> for ScheduleData {
    fn from(schedule: Schedule) -> Self {
        ScheduleData {
            num_teams: schedule.num_teams,
            weeks: schedule.weeks,
        }
    }
}
