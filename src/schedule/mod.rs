//! Schedule model.
//!
//! Represents a double round-robin timetable and mutates it only through
//! invariant-preserving moves, so an invalid candidate can never be
//! produced by the search.
//!
//! - [`Schedule`]: weeks of [`Meeting`]s with circle-method construction
//! - [`ScheduleViolation`]: first broken invariant reported by `validate`

mod timetable;
mod violation;

pub use timetable::{Meeting, Schedule};
pub use violation::ScheduleViolation;
