//! Timetable invariant violations.

use thiserror::Error;

/// The first broken invariant found by
/// [`Schedule::validate`](super::Schedule::validate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleViolation {
    /// The timetable does not have `2·(N−1)` weeks.
    #[error("expected {expected} weeks, found {actual}")]
    WeekCount {
        /// Required number of weeks.
        expected: usize,
        /// Number of weeks present.
        actual: usize,
    },
    /// A meeting references a team outside `0..N`.
    #[error("week {week} references unknown team {team}")]
    UnknownTeam {
        /// Week index.
        week: usize,
        /// Offending team index.
        team: usize,
    },
    /// A team is scheduled against itself.
    #[error("team {team} plays itself in week {week}")]
    SelfPlay {
        /// Week index.
        week: usize,
        /// Offending team index.
        team: usize,
    },
    /// A team appears in more than one meeting of a week.
    #[error("team {team} plays more than once in week {week}")]
    PlaysTwice {
        /// Team index.
        team: usize,
        /// Week index.
        week: usize,
    },
    /// A team has no meeting in a week.
    #[error("team {team} does not play in week {week}")]
    Idle {
        /// Team index.
        team: usize,
        /// Week index.
        week: usize,
    },
    /// An ordered pairing never occurs.
    #[error("team {home} never hosts team {away}")]
    PairingMissing {
        /// Hosting team index.
        home: usize,
        /// Travelling team index.
        away: usize,
    },
    /// An ordered pairing occurs more than once.
    #[error("team {home} hosts team {away} {count} times")]
    PairingRepeated {
        /// Hosting team index.
        home: usize,
        /// Travelling team index.
        away: usize,
        /// Number of occurrences.
        count: usize,
    },
    /// The pairing-to-week index disagrees with the timetable.
    #[error("pairing index for home {home} / away {away} is out of sync")]
    StaleIndex {
        /// Hosting team index.
        home: usize,
        /// Travelling team index.
        away: usize,
    },
}
