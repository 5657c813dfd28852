//! Transport mode selection for a fixed timetable.
//!
//! # Unconstrained
//!
//! Choosing the mode of one trip never affects another, so emission
//! minimisation is separable: each trip takes its lower-emission mode,
//! ties broken by lower time, then plane before train.
//!
//! # Within an emission budget
//!
//! When total time is minimised subject to an emission budget, every trip
//! whose faster mode emits more becomes an [`Upgrade`]: spending
//! `extra_emissions` of the budget buys `time_saved`. Selecting upgrades is
//! a 0/1 knapsack; [`assign_within_budget`] is the classic greedy by
//! time saved per unit of emissions, used to seed the search.
//!
//! # Reference
//!
//! Dantzig, G.B. (1957). "Discrete-variable extremum problems",
//! *Operations Research* 5(2), 266-288.

use std::cmp::Ordering;

use super::Assignment;
use crate::evaluation::fits_budget;
use crate::models::TransportMode;
use crate::params::{ParameterTable, TravelOption};

/// Mode with the lower emissions; ties by lower time, then plane first.
pub fn preferred_mode(option: &TravelOption) -> TransportMode {
    let key = |m: TransportMode| (option.emission(m), option.time(m), m);
    let (plane, train) = (key(TransportMode::Plane), key(TransportMode::Train));
    match plane.partial_cmp(&train) {
        Some(Ordering::Greater) => TransportMode::Train,
        _ => TransportMode::Plane,
    }
}

/// Mode with the lower time; ties by lower emissions, then plane first.
pub fn fastest_mode(option: &TravelOption) -> TransportMode {
    let key = |m: TransportMode| (option.time(m), option.emission(m), m);
    let (plane, train) = (key(TransportMode::Plane), key(TransportMode::Train));
    match plane.partial_cmp(&train) {
        Some(Ordering::Greater) => TransportMode::Train,
        _ => TransportMode::Plane,
    }
}

/// Assigns every trip its [`preferred_mode`].
///
/// This is the emission-optimal assignment for any timetable.
///
/// # Examples
///
/// ```
/// use u_league::params::{ParameterTable, TravelOption};
/// use u_league::transport::assign_unconstrained;
/// use u_league::models::TransportMode;
///
/// let table = ParameterTable::from_fn(4, |_, _| TravelOption::new(120.0, 15.0, 2.0, 6.0))
///     .unwrap();
/// let assignment = assign_unconstrained(&table);
/// assert_eq!(assignment.count(TransportMode::Train), 12);
/// ```
pub fn assign_unconstrained(table: &ParameterTable) -> Assignment {
    Assignment::from_fn(table.size(), |home, away| {
        preferred_mode(table.option(home, away))
    })
}

/// Switching one trip from its preferred mode to a strictly faster one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Upgrade {
    /// Hosting team index.
    pub home: usize,
    /// Travelling team index.
    pub away: usize,
    /// Mode after the upgrade.
    pub mode: TransportMode,
    /// Additional emissions (strictly positive).
    pub extra_emissions: f64,
    /// Time saved (strictly positive).
    pub time_saved: f64,
}

impl Upgrade {
    /// Time saved per unit of extra emissions.
    pub fn ratio(&self) -> f64 {
        self.time_saved / self.extra_emissions
    }
}

/// The upgrade available for a single pairing, if any.
pub fn upgrade_for(table: &ParameterTable, home: usize, away: usize) -> Option<Upgrade> {
    let option = table.get(home, away)?;
    let base = preferred_mode(option);
    let alt = base.other();
    let extra = option.emission(alt) - option.emission(base);
    let saved = option.time(base) - option.time(alt);
    // `preferred_mode` resolves equal emissions by time, so a faster
    // alternative always costs strictly more emissions
    if saved > 0.0 && extra > 0.0 {
        Some(Upgrade {
            home,
            away,
            mode: alt,
            extra_emissions: extra,
            time_saved: saved,
        })
    } else {
        None
    }
}

/// All upgrades, best ratio first; ties by pairing order.
pub fn upgrades(table: &ParameterTable) -> Vec<Upgrade> {
    let n = table.size();
    let mut out: Vec<Upgrade> = (0..n)
        .flat_map(|home| (0..n).map(move |away| (home, away)))
        .filter(|(home, away)| home != away)
        .filter_map(|(home, away)| upgrade_for(table, home, away))
        .collect();
    sort_by_ratio(&mut out);
    out
}

fn sort_by_ratio(upgrades: &mut [Upgrade]) {
    upgrades.sort_by(|a, b| {
        b.ratio()
            .partial_cmp(&a.ratio())
            .unwrap_or(Ordering::Equal)
            .then_with(|| (a.home, a.away).cmp(&(b.home, b.away)))
    });
}

/// Greedy time minimisation under an emission budget.
///
/// Starts from [`assign_unconstrained`] and applies upgrades in ratio
/// order while they fit. Returns `None` if even the emission-minimal
/// assignment exceeds `budget`.
pub fn assign_within_budget(table: &ParameterTable, budget: f64) -> Option<Assignment> {
    let mut assignment = assign_unconstrained(table);
    let mut emissions = table.min_total_emissions();
    if !fits_budget(emissions, budget) {
        return None;
    }
    for up in upgrades(table) {
        if fits_budget(emissions + up.extra_emissions, budget) {
            assignment.set(up.home, up.away, up.mode);
            emissions += up.extra_emissions;
        }
    }
    Some(assignment)
}

/// Assigns the preferred mode to every pairing without one.
///
/// Returns the pairings that were filled.
pub fn complete_with_preferred(
    table: &ParameterTable,
    assignment: &mut Assignment,
) -> Vec<(usize, usize)> {
    let missing = assignment.missing();
    for &(home, away) in &missing {
        assignment.set(home, away, preferred_mode(table.option(home, away)));
    }
    missing
}

/// Applies upgrades among `candidates` in ratio order while they fit.
///
/// `emissions` is the current total of `assignment`; the new total is
/// returned. Candidates already on their faster mode are skipped.
pub fn upgrade_greedily(
    table: &ParameterTable,
    assignment: &mut Assignment,
    candidates: &[(usize, usize)],
    budget: f64,
    mut emissions: f64,
) -> f64 {
    let mut ups: Vec<Upgrade> = candidates
        .iter()
        .filter_map(|&(home, away)| upgrade_for(table, home, away))
        .filter(|up| assignment.mode(up.home, up.away) != Some(up.mode))
        .collect();
    sort_by_ratio(&mut ups);
    for up in ups {
        if fits_budget(emissions + up.extra_emissions, budget) {
            assignment.set(up.home, up.away, up.mode);
            emissions += up.extra_emissions;
        }
    }
    emissions
}

/// Reverts upgrades, worst ratio first, until the budget holds.
///
/// `emissions` is the current total of `assignment`. Returns the new total
/// if the budget could be met.
pub fn repair_to_budget(
    table: &ParameterTable,
    assignment: &mut Assignment,
    budget: f64,
    mut emissions: f64,
) -> Option<f64> {
    if fits_budget(emissions, budget) {
        return Some(emissions);
    }
    let mut applied: Vec<(usize, usize, f64, f64)> = assignment
        .pairs()
        .filter_map(|(home, away, mode)| {
            let mode = mode?;
            let option = table.get(home, away)?;
            let base = preferred_mode(option);
            (mode != base).then(|| {
                let extra = option.emission(mode) - option.emission(base);
                let saved = option.time(base) - option.time(mode);
                (home, away, extra, saved)
            })
        })
        .collect();
    // Revert the least time saved per emission first; non-positive
    // savings are pure losses and go before anything else
    applied.sort_by(|a, b| {
        let ra = if a.2 > 0.0 { a.3 / a.2 } else { f64::NEG_INFINITY };
        let rb = if b.2 > 0.0 { b.3 / b.2 } else { f64::NEG_INFINITY };
        ra.partial_cmp(&rb)
            .unwrap_or(Ordering::Equal)
            .then_with(|| (a.0, a.1).cmp(&(b.0, b.1)))
    });
    for (home, away, extra, _) in applied {
        if fits_budget(emissions, budget) {
            break;
        }
        assignment.flip(home, away);
        emissions -= extra;
    }
    fits_budget(emissions, budget).then_some(emissions)
}
