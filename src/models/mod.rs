//! Domain model types for league scheduling.
//!
//! Provides the core abstractions: the team set, transport modes, fixtures,
//! evaluated solutions and the typed outcome of a solve.

mod fixture;
mod mode;
mod outcome;
mod solution;
mod team;

pub use fixture::Fixture;
pub use mode::TransportMode;
pub use outcome::{Infeasibility, SearchStats, SolveOutcome, SolveReport, SolveStatus};
pub use solution::Solution;
pub use team::TeamSet;
