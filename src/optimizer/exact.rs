//! Exact strategy.
//!
//! Every ordered pairing is played exactly once whatever the timetable, so
//! the totals depend only on the mode indicators. Starting from the
//! emission-minimal assignment, each trip with a faster but dirtier mode
//! is an [`Upgrade`]; minimising time within the emission budget is then a
//! 0/1 knapsack (maximise time saved, capacity = budget − minimum
//! emissions), solved here by depth-first branch and bound.
//!
//! # Bound
//!
//! Items are sorted by time saved per unit of emissions. At a node, the
//! remaining items are added greedily and the first one that does not fit
//! is added fractionally (Dantzig bound), which is an upper bound on the
//! time any completion can save.
//!
//! The search is anytime: a node limit and the shared termination rule
//! stop it early, in which case the incumbent is reported as best found.
//!
//! # Reference
//!
//! Dantzig, G.B. (1957). "Discrete-variable extremum problems",
//! *Operations Research* 5(2), 266-288.

use log::{debug, warn};

use super::search::{SearchContext, WorkerReport};
use crate::error::LeagueError;
use crate::evaluation::{Objective, BUDGET_TOLERANCE};
use crate::models::Solution;
use crate::schedule::Schedule;
use crate::transport::{assign_unconstrained, upgrades, Upgrade};

/// Nodes between two termination checks.
const CHECK_INTERVAL: u64 = 1024;

/// Runs the exact strategy as a single worker.
pub(crate) fn run(ctx: &SearchContext<'_>, worker: usize) -> Result<WorkerReport, LeagueError> {
    let evaluator = ctx.evaluator;
    let table = evaluator.table();
    let min_emissions = evaluator.min_emissions();

    // Every upgrade adds emissions, so none can improve the primary key
    // of the emission objective
    let items = match ctx.objective {
        Objective::MinEmissions => Vec::new(),
        Objective::MinTimeWithinBudget => upgrades(table),
    };
    let budget = evaluator.budget();
    let capacity = budget + BUDGET_TOLERANCE * budget.abs().max(1.0) - min_emissions;

    let mut bnb = BranchAndBound::new(items, capacity, ctx);
    bnb.solve();
    if bnb.aborted {
        warn!(
            "worker {worker}: exact search stopped after {} nodes, optimality not proven",
            bnb.nodes
        );
    } else {
        debug!("worker {worker}: exact search closed after {} nodes", bnb.nodes);
    }

    let mut assignment = assign_unconstrained(table);
    for (item, _) in bnb.items.iter().zip(&bnb.best_taken).filter(|(_, taken)| **taken) {
        assignment.set(item.home, item.away, item.mode);
    }
    let schedule = Schedule::build_initial(evaluator.num_teams())?;
    let best = Solution::evaluate(evaluator, schedule, assignment)?;

    Ok(WorkerReport {
        worker,
        best,
        iterations: 0,
        nodes: bnb.nodes,
        proven_optimal: !bnb.aborted,
    })
}

/// 0/1 knapsack over upgrades: most time saved, then least emissions added.
struct BranchAndBound<'c, 'a> {
    items: Vec<Upgrade>,
    capacity: f64,
    ctx: &'c SearchContext<'a>,
    node_limit: u64,
    nodes: u64,
    aborted: bool,
    taken: Vec<bool>,
    best_taken: Vec<bool>,
    best_saved: f64,
    best_used: f64,
}

impl<'c, 'a> BranchAndBound<'c, 'a> {
    fn new(items: Vec<Upgrade>, capacity: f64, ctx: &'c SearchContext<'a>) -> Self {
        let n = items.len();
        Self {
            items,
            capacity,
            ctx,
            node_limit: ctx.config.exact_node_limit,
            nodes: 0,
            aborted: false,
            taken: vec![false; n],
            best_taken: vec![false; n],
            best_saved: 0.0,
            best_used: 0.0,
        }
    }

    fn solve(&mut self) {
        self.seed_greedy();
        self.branch(0, 0.0, 0.0);
    }

    /// Incumbent from the ratio-greedy rule.
    fn seed_greedy(&mut self) {
        let (mut used, mut saved) = (0.0, 0.0);
        for (i, item) in self.items.iter().enumerate() {
            if used + item.extra_emissions <= self.capacity {
                used += item.extra_emissions;
                saved += item.time_saved;
                self.best_taken[i] = true;
            }
        }
        self.best_used = used;
        self.best_saved = saved;
    }

    fn branch(&mut self, i: usize, used: f64, saved: f64) {
        if self.aborted {
            return;
        }
        self.nodes += 1;
        let check = self.nodes % CHECK_INTERVAL == 0;
        if self.nodes >= self.node_limit || (check && self.stop_requested()) {
            self.aborted = true;
            return;
        }

        if saved > self.best_saved || (saved == self.best_saved && used < self.best_used) {
            self.best_saved = saved;
            self.best_used = used;
            self.best_taken.copy_from_slice(&self.taken);
        }
        if i == self.items.len() || !self.promising(self.bound(i, used, saved), used) {
            return;
        }

        let item = self.items[i];
        if used + item.extra_emissions <= self.capacity {
            self.taken[i] = true;
            self.branch(i + 1, used + item.extra_emissions, saved + item.time_saved);
            self.taken[i] = false;
        }
        self.branch(i + 1, used, saved);
    }

    /// Dantzig bound on the time saved by any completion of the node.
    fn bound(&self, i: usize, used: f64, saved: f64) -> f64 {
        let mut room = self.capacity - used;
        let mut bound = saved;
        for item in &self.items[i..] {
            if item.extra_emissions <= room {
                room -= item.extra_emissions;
                bound += item.time_saved;
            } else {
                bound += item.ratio() * room;
                break;
            }
        }
        bound
    }

    /// A node can still beat the incumbent on time, or tie it on time
    /// with fewer emissions.
    fn promising(&self, bound: f64, used: f64) -> bool {
        let tol = 1e-9 * self.best_saved.abs().max(1.0);
        bound > self.best_saved + tol || (bound >= self.best_saved - tol && used < self.best_used)
    }

    fn stop_requested(&self) -> bool {
        self.ctx.termination.is_halted()
    }
}
