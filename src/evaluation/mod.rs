//! Objective evaluation.
//!
//! - [`Evaluator`]: totals, percentage reduction and the budget check
//! - [`BaselineSource`]: how `E₀` is obtained
//! - [`Objective`]: lexicographic objectives and the candidate order

mod baseline;
mod evaluator;
mod objective;

pub use baseline::BaselineSource;
pub use evaluator::{fits_budget, Evaluation, Evaluator, TeamTotals, BUDGET_TOLERANCE};
pub use objective::Objective;
