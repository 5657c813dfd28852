//! Search over timetables and transport modes.
//!
//! - [`Optimizer`]: entry point, returns a [`SolveReport`](crate::models::SolveReport)
//! - [`SolverConfig`], [`Strategy`]: what to run and for how long
//! - [`Termination`]: deadline, iteration limit and interrupt flag
//!
//! Strategies: exact branch and bound over the mode indicators, simulated
//! annealing, descent, a genetic algorithm and adaptive large-neighbourhood
//! search. The last two run on the `u-metaheur` runners.

mod annealing;
mod config;
mod coordinator;
mod exact;
mod genetic;
mod lns;
mod search;
mod solver;
mod termination;

pub use config::{SolverConfig, Strategy};
pub use solver::Optimizer;
pub use termination::Termination;
