//! Resource repair: station and depot insertion for battery and cargo.
//!
//! # Algorithm
//!
//! Walks the route leg by leg with cargo and battery starting full at the
//! depot. Arriving at the depot refills both; arriving at a station refills
//! the battery only. Before committing each leg the projected charge and
//! load are checked:
//!
//! - **Battery short**: backtrack through the current charge segment (back
//!   to the last depot or station) and, at the latest position that can
//!   reach it, insert the nearest station from which the following leg fits
//!   in a full battery. If no station does, the depot is tried the same way.
//!   As a last resort a station that only shortens the leg is inserted and
//!   the next pass chains another one after it.
//! - **Cargo short**: close the trip with a depot visit at the latest
//!   earlier position that can still reach the depot. If none can, the depot
//!   goes right before the overflowing customer and the battery rule then
//!   puts a station in front of it.
//!
//! After an insertion the walk resumes at the inserted node, so every
//! committed leg is feasible.
//!
//! # Complexity
//!
//! Each insertion backtracks at most one segment. Insertions are capped at
//! route length × (stations + 2).

use crate::evaluation::ENERGY_TOLERANCE;
use crate::models::{ProblemInstance, Route, DEPOT};

/// Why resource repair gave up on a route.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepairError {
    #[error("Route does not start at the depot")]
    MissingDepotStart,
    #[error("No station or depot is reachable to serve leg {from} -> {to}")]
    Stranded { from: usize, to: usize },
    #[error("Insertion budget of {0} exhausted")]
    InsertionBudgetExhausted(usize),
}

/// Load and charge after arriving at a node.
#[derive(Debug, Clone, Copy)]
struct Reserve {
    cargo: i32,
    battery: f64,
}

/// Inserts stations and depot visits until every leg respects cargo and
/// battery.
///
/// Expects a structurally valid route (see
/// [`repair_structure`](super::repair_structure)); a missing final depot is
/// appended. Returns [`RepairError`] when some leg cannot be served at all.
///
/// # Examples
///
/// ```
/// use evrp_ga::models::{ProblemInstance, Route};
/// use evrp_ga::repair::repair_resources;
///
/// // Customer 2 is 9 away and the battery lasts 10. The station sits at 5.
/// let instance = ProblemInstance::builder(2)
///     .capacity(10)
///     .energy(10.0, 1.0)
///     .depot(0.0, 0.0)
///     .customer(2, 9.0, 0.0, 1)
///     .station(3, 5.0, 0.0)
///     .build()
///     .unwrap();
///
/// let route = repair_resources(Route::new(vec![1, 2, 1]), &instance).unwrap();
/// assert_eq!(route.nodes(), &[1, 3, 2, 3, 1]);
/// ```
pub fn repair_resources(route: Route, instance: &ProblemInstance) -> Result<Route, RepairError> {
    let mut nodes = route.into_nodes();
    if nodes.first() != Some(&DEPOT) {
        return Err(RepairError::MissingDepotStart);
    }
    if nodes.last() != Some(&DEPOT) || nodes.len() == 1 {
        nodes.push(DEPOT);
    }

    let full = Reserve {
        cargo: instance.capacity(),
        battery: instance.energy_capacity(),
    };
    let budget = nodes.len() * (instance.stations().len() + 2);
    let mut insertions = 0;
    let mut reserves = vec![full];
    let mut i = 1;

    while i < nodes.len() {
        let (from, to) = (nodes[i - 1], nodes[i]);
        let prev = reserves[i - 1];
        let battery = prev.battery - instance.energy(from, to);
        let cargo = if instance.is_customer(to) {
            prev.cargo - instance.demand(to)
        } else {
            prev.cargo
        };

        let battery_ok = battery >= -ENERGY_TOLERANCE;
        if battery_ok && cargo >= 0 {
            reserves.push(if to == DEPOT {
                full
            } else if instance.is_station(to) {
                Reserve {
                    cargo,
                    battery: full.battery,
                }
            } else {
                Reserve { cargo, battery }
            });
            i += 1;
            continue;
        }

        if insertions == budget {
            return Err(RepairError::InsertionBudgetExhausted(budget));
        }
        insertions += 1;

        let (at, node) = if !battery_ok {
            recharge_point(&nodes, &reserves, i, instance)?
        } else {
            (trip_split_point(&nodes, &reserves, i, instance), DEPOT)
        };
        log::trace!("inserting node {node} at position {at}");
        nodes.insert(at, node);
        reserves.truncate(at);
        i = at;
    }

    Ok(Route::new(nodes))
}

/// Where to insert a charging stop so the leg ending at `i` can be served.
///
/// A stop at `k + 1` must be reachable from `nodes[k]` and must leave more
/// charge on arrival at `nodes[k + 1]` than the current leg does, so a stop
/// next to a full battery is never chosen. Preference order, each scanned
/// from the latest position back to the start of the charge segment:
///
/// 1. the nearest station that covers the following leg on a full charge;
/// 2. the depot under the same rule, closing the trip early;
/// 3. the nearest station that only shortens the following leg, so the
///    next pass can chain another one after it.
fn recharge_point(
    nodes: &[usize],
    reserves: &[Reserve],
    i: usize,
    instance: &ProblemInstance,
) -> Result<(usize, usize), RepairError> {
    let full = instance.energy_capacity();
    let segment_start = (0..i)
        .rev()
        .find(|&k| instance.recharges_at(nodes[k]))
        .unwrap_or(0);

    let arrival = |k: usize| reserves[k].battery - instance.energy(nodes[k], nodes[k + 1]);
    let via = |k: usize, stop: usize| full - instance.energy(stop, nodes[k + 1]);
    let helps = |k: usize, stop: usize| {
        stop != nodes[k]
            && stop != nodes[k + 1]
            && reserves[k].battery - instance.energy(nodes[k], stop) >= -ENERGY_TOLERANCE
            && via(k, stop) > arrival(k) + ENERGY_TOLERANCE
    };
    let serves = |k: usize, stop: usize| helps(k, stop) && via(k, stop) >= -ENERGY_TOLERANCE;

    for k in (segment_start..i).rev() {
        if let Some(station) = instance.nearest_station(nodes[k], |s| serves(k, s)) {
            return Ok((k + 1, station));
        }
    }

    for k in (segment_start..i).rev() {
        if serves(k, DEPOT) {
            log::debug!("no station covers the leg, closing trip after node {}", nodes[k]);
            return Ok((k + 1, DEPOT));
        }
    }

    for k in (segment_start..i).rev() {
        if let Some(station) = instance.nearest_station(nodes[k], |s| helps(k, s)) {
            return Ok((k + 1, station));
        }
    }

    Err(RepairError::Stranded {
        from: nodes[i - 1],
        to: nodes[i],
    })
}

/// Where to insert a depot visit when cargo runs out on arrival at `i`.
fn trip_split_point(
    nodes: &[usize],
    reserves: &[Reserve],
    i: usize,
    instance: &ProblemInstance,
) -> usize {
    let trip_start = (0..i).rev().find(|&k| nodes[k] == DEPOT).unwrap_or(0);
    ((trip_start + 1)..i)
        .rev()
        .find(|&k| {
            reserves[k].battery - instance.energy(nodes[k], DEPOT) >= -ENERGY_TOLERANCE
        })
        .map_or(i, |k| k + 1)
}
