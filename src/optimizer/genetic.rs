//! Genetic strategy.
//!
//! Implements [`GaProblem`](u_metaheur::ga::GaProblem) over a season
//! encoding relative to a base timetable:
//!
//! - **week order**: a permutation of the base weeks;
//! - **venue swaps**: one bit per unordered pair, applying
//!   [`Schedule::swap_home_away`] after the permutation;
//! - **alternative modes**: one bit per ordered pair, set when the trip
//!   uses the mode that is not emission-preferred.
//!
//! Both timetable genes decode through invariant-preserving moves, so every
//! individual is a valid double round-robin. Crossover is order crossover
//! (OX) on the week order and uniform on the bits; mutation swaps two
//! weeks and flips one venue bit and one mode bit.
//!
//! The runner is restarted in epochs from the incumbent, which is injected
//! as the first individual of each population. Each epoch is capped by the
//! iterations left and gets the remaining wall-clock time; an interrupt or
//! an expired deadline cancels the runner at the next generation.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace};
use rand::Rng;
use u_metaheur::ga::operators::{order_crossover, swap_mutation};
use u_metaheur::ga::{GaConfig, GaProblem, GaRunner, Individual};

use super::search::{Scalarizer, SearchContext, WorkerReport};
use super::termination::Termination;
use crate::error::LeagueError;
use crate::evaluation::{Evaluator, Objective};
use crate::models::{Solution, TransportMode};
use crate::schedule::Schedule;
use crate::transport::{preferred_mode, repair_to_budget, Assignment};

/// Probability of an alternative-mode bit in a random individual.
const ALTERNATIVE_RATE: f64 = 0.1;

/// Share of the population carried over unchanged.
const ELITE_RATE: f64 = 0.1;

/// One season: week order, venue swaps and mode choices.
#[derive(Debug, Clone)]
pub(crate) struct SeasonChromosome {
    week_order: Vec<usize>,
    venue_swaps: Vec<bool>,
    alternative: Vec<bool>,
    fitness: f64,
}

impl SeasonChromosome {
    fn new(week_order: Vec<usize>, venue_swaps: Vec<bool>, alternative: Vec<bool>) -> Self {
        Self {
            week_order,
            venue_swaps,
            alternative,
            fitness: f64::INFINITY,
        }
    }
}

impl Individual for SeasonChromosome {
    type Fitness = f64;

    fn fitness(&self) -> f64 {
        self.fitness
    }

    fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }
}

/// GA problem for one epoch.
pub(crate) struct SeasonGaProblem<'a> {
    evaluator: Evaluator,
    base: Schedule,
    unordered: Vec<(usize, usize)>,
    preferred: Vec<TransportMode>,
    scalar: Scalarizer,
    incumbent: SeasonChromosome,
    created: AtomicUsize,
    termination: Option<Termination<'a>>,
    cancel: Arc<AtomicBool>,
}

impl<'a> SeasonGaProblem<'a> {
    /// Creates a problem whose base timetable and seed individual are `incumbent`.
    pub fn new(evaluator: Evaluator, incumbent: &Solution, objective: Objective) -> Self {
        let n = evaluator.num_teams();
        let table = evaluator.table();
        let unordered: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();
        let ordered: Vec<(usize, usize)> = (0..n)
            .flat_map(|h| (0..n).map(move |a| (h, a)))
            .filter(|(h, a)| h != a)
            .collect();
        let preferred: Vec<TransportMode> = ordered
            .iter()
            .map(|&(h, a)| preferred_mode(table.option(h, a)))
            .collect();
        let alternative = ordered
            .iter()
            .zip(&preferred)
            .map(|(&(h, a), &p)| incumbent.assignment.mode(h, a).is_some_and(|m| m != p))
            .collect();
        let base = incumbent.schedule.clone();
        let incumbent = SeasonChromosome::new(
            (0..base.num_weeks()).collect(),
            vec![false; unordered.len()],
            alternative,
        );
        let scalar = Scalarizer::new(&evaluator, objective);
        Self {
            evaluator,
            base,
            unordered,
            preferred,
            scalar,
            incumbent,
            created: AtomicUsize::new(0),
            termination: None,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stops evaluating once `termination` is interrupted or out of time.
    pub fn with_termination(mut self, termination: Termination<'a>) -> Self {
        self.termination = Some(termination);
        self
    }

    /// Flag raised when the run should be cancelled.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn halted(&self) -> bool {
        if self.cancel.load(Ordering::Relaxed) {
            return true;
        }
        let halted = self.termination.is_some_and(|t| t.is_halted());
        if halted {
            self.cancel.store(true, Ordering::Relaxed);
        }
        halted
    }

    /// Builds the timetable and assignment encoded by `c`.
    pub fn decode(&self, c: &SeasonChromosome) -> (Schedule, Assignment) {
        let n = self.evaluator.num_teams();
        let weeks = c.week_order.iter().map(|&w| self.base.week(w).to_vec()).collect();
        let mut schedule = Schedule::from_weeks(n, weeks);
        for (&(i, j), _) in self.unordered.iter().zip(&c.venue_swaps).filter(|(_, s)| **s) {
            schedule.swap_home_away(i, j);
        }
        let mut k = 0;
        let assignment = Assignment::from_fn(n, |_, _| {
            let mode = if c.alternative[k] {
                self.preferred[k].other()
            } else {
                self.preferred[k]
            };
            k += 1;
            mode
        });
        (schedule, assignment)
    }
}

impl GaProblem for SeasonGaProblem<'_> {
    type Individual = SeasonChromosome;

    fn create_individual<R: Rng>(&self, rng: &mut R) -> SeasonChromosome {
        if self.created.fetch_add(1, Ordering::Relaxed) == 0 {
            return self.incumbent.clone();
        }
        let mut weeks: Vec<usize> = (0..self.base.num_weeks()).collect();
        // Fisher-Yates shuffle
        for i in (1..weeks.len()).rev() {
            let j = rng.random_range(0..=i);
            weeks.swap(i, j);
        }
        let venue_swaps = (0..self.unordered.len()).map(|_| rng.random_bool(0.5)).collect();
        let alternative = (0..self.preferred.len())
            .map(|_| rng.random_bool(ALTERNATIVE_RATE))
            .collect();
        SeasonChromosome::new(weeks, venue_swaps, alternative)
    }

    fn evaluate(&self, individual: &SeasonChromosome) -> f64 {
        if self.halted() {
            return f64::INFINITY;
        }
        let (schedule, assignment) = self.decode(individual);
        match self.evaluator.evaluate(&schedule, &assignment) {
            Ok(eval) => self.scalar.fitness(&self.evaluator, &eval, schedule.breaks()),
            Err(_) => f64::INFINITY,
        }
    }

    fn crossover<R: Rng>(
        &self,
        parent1: &SeasonChromosome,
        parent2: &SeasonChromosome,
        rng: &mut R,
    ) -> Vec<SeasonChromosome> {
        let (w1, w2) = order_crossover(&parent1.week_order, &parent2.week_order, rng);
        let (v1, v2) = uniform_crossover(&parent1.venue_swaps, &parent2.venue_swaps, rng);
        let (a1, a2) = uniform_crossover(&parent1.alternative, &parent2.alternative, rng);
        vec![SeasonChromosome::new(w1, v1, a1), SeasonChromosome::new(w2, v2, a2)]
    }

    fn mutate<R: Rng>(&self, individual: &mut SeasonChromosome, rng: &mut R) {
        if individual.week_order.len() >= 2 {
            swap_mutation(&mut individual.week_order, rng);
        }
        if !individual.venue_swaps.is_empty() && rng.random_bool(0.5) {
            let k = rng.random_range(0..individual.venue_swaps.len());
            individual.venue_swaps[k] = !individual.venue_swaps[k];
        }
        if !individual.alternative.is_empty() {
            let k = rng.random_range(0..individual.alternative.len());
            individual.alternative[k] = !individual.alternative[k];
        }
    }

    fn on_generation(&self, _generation: usize, _best_fitness: f64) {
        self.halted();
    }
}

/// Elite share keeping at least one and fewer than `population` elites.
fn elite_ratio(population: usize) -> f64 {
    (1.5 / population.max(2) as f64).max(ELITE_RATE)
}

/// Runner configuration for an epoch of `generations` generations.
pub(crate) fn epoch_config(
    population: usize,
    generations: u64,
    time_left: Option<Duration>,
    seed: u64,
) -> GaConfig {
    let mut ga_config = GaConfig::default()
        .with_population_size(population)
        .with_elite_ratio(elite_ratio(population))
        .with_max_generations(usize::try_from(generations).unwrap_or(usize::MAX))
        .with_seed(seed)
        .with_parallel(false);
    if let Some(left) = time_left {
        let ms = u64::try_from(left.as_millis()).unwrap_or(u64::MAX);
        ga_config = ga_config.with_time_limit_ms(ms.max(1));
    }
    ga_config
}

fn uniform_crossover<R: Rng>(p1: &[bool], p2: &[bool], rng: &mut R) -> (Vec<bool>, Vec<bool>) {
    p1.iter()
        .zip(p2)
        .map(|(&a, &b)| if rng.random_bool(0.5) { (a, b) } else { (b, a) })
        .unzip()
}

/// Runs the genetic strategy as one worker.
pub(crate) fn run(ctx: &SearchContext<'_>, worker: usize) -> Result<WorkerReport, LeagueError> {
    let evaluator = ctx.evaluator;
    let config = ctx.config;
    let mut rng = ctx.rng(worker);
    let mut best = ctx.initial_solution(worker, &mut rng)?;

    let termination = ctx.termination;
    let mut generations = 0u64;
    let mut epoch = 0u64;
    while !termination.should_stop(generations) {
        let epoch_len = termination.next_chunk(generations, config.generations_per_epoch as u64);
        let problem = SeasonGaProblem::new(evaluator.clone(), &best, ctx.objective)
            .with_termination(termination);
        let ga_config = epoch_config(
            config.population_size,
            epoch_len,
            termination.remaining_time(),
            rng.random::<u64>(),
        );
        let result = GaRunner::run_with_cancel(&problem, &ga_config, Some(problem.cancel_flag()))
            .map_err(LeagueError::InvalidConfig)?;
        generations += (result.generations as u64).min(epoch_len);
        epoch += 1;

        let (schedule, assignment) = problem.decode(&result.best);
        let mut candidate = Solution::evaluate(evaluator, schedule, assignment)?;
        if !candidate.meets_target() {
            let mut repaired = candidate.assignment.clone();
            let table = evaluator.table();
            let emissions = candidate.total_emissions();
            if repair_to_budget(table, &mut repaired, evaluator.budget(), emissions).is_some() {
                candidate = Solution::evaluate(evaluator, candidate.schedule.clone(), repaired)?;
            }
        }
        if ctx.keep_best(&mut best, candidate) {
            trace!(
                "worker {worker}: epoch {epoch}, best emissions {:.3}, time {:.3}",
                best.total_emissions(),
                best.total_time()
            );
        }
        debug!(
            "worker {worker}: genetic epoch {epoch} done, epoch fitness {:.6}",
            result.best_fitness
        );
    }

    Ok(WorkerReport {
        worker,
        best,
        iterations: generations,
        nodes: 0,
        proven_optimal: false,
    })
}
