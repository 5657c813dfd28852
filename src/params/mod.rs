//! Travel parameter table.
//!
//! Per-ordered-pair round-trip emissions and durations for each transport
//! mode, supplied by an external route-computation pipeline and consumed
//! read-only for the whole run.

mod records;
mod table;

pub use records::{RouteLeg, TravelRecord};
pub use table::{ParameterTable, TravelOption};
