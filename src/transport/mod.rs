//! Transport assigner.
//!
//! - [`Assignment`]: mode per ordered pairing (= per fixture)
//! - [`assign_unconstrained`]: separable emission minimisation
//! - [`assign_within_budget`]: greedy time minimisation under an emission budget
//! - [`upgrades`], [`repair_to_budget`], [`upgrade_greedily`]: building
//!   blocks shared by the exact and metaheuristic strategies

mod assigner;
mod assignment;

pub use assigner::{
    assign_unconstrained, assign_within_budget, complete_with_preferred, fastest_mode,
    preferred_mode, repair_to_budget, upgrade_for, upgrade_greedily, upgrades, Upgrade,
};
pub use assignment::Assignment;
