//! # u-league
//!
//! Double round-robin league scheduling with per-trip transport mode
//! selection under a CO₂ reduction target.
//!
//! Every pair of teams meets twice, once at each venue. For each match the
//! away team travels by plane or train; the search minimises total
//! emissions (or total travel time within an emission budget) and reports
//! whether the requested percentage reduction against a baseline `E₀` is
//! reachable at all.
//!
//! ## Modules
//!
//! - [`models`]: teams, transport modes, fixtures, solutions and solve outcomes
//! - [`params`]: per-pair travel parameter table and its loaders
//! - [`schedule`]: circle-method timetable, structural moves and invariant checks
//! - [`transport`]: mode assignment and the constructive assigners
//! - [`evaluation`]: totals, baseline, budget and the objective order
//! - [`optimizer`]: exact and metaheuristic strategies behind [`optimizer::Optimizer`]
//! - [`validation`]: independent recomputation of returned solutions
//! - [`error`]: the crate error type
//!
//! ## Example
//!
//! ```
//! use u_league::models::{SolveStatus, TransportMode};
//! use u_league::optimizer::{Optimizer, SolverConfig};
//! use u_league::params::{ParameterTable, TravelOption};
//!
//! let table = ParameterTable::from_fn(4, |_, _| TravelOption::new(120.0, 30.0, 1.0, 4.0))
//!     .unwrap();
//! let report = Optimizer::new(table, SolverConfig::default()).unwrap().solve().unwrap();
//!
//! assert_eq!(report.status(), SolveStatus::ProvenOptimal);
//! assert_eq!(report.solution().assignment().count(TransportMode::Train), 12);
//! ```

pub mod error;
pub mod evaluation;
pub mod models;
pub mod optimizer;
pub mod params;
pub mod schedule;
pub mod transport;
pub mod validation;
