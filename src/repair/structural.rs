//! Structural repair: depot boundaries, customer coverage, trip layout.
//!
//! # Algorithm
//!
//! 1. Keep the candidate's customers (and stations, when allowed) in visit
//!    order; depot markers and unknown ids are dropped.
//! 2. Deduplicate customers, keeping the first occurrence.
//! 3. Append missing customers in the order the template visits them, then
//!    any still missing in ascending id order.
//! 4. Lay the sequence out over the template's trips: trip `k` receives as
//!    many customers as template trip `k` served. Stations stay in the trip
//!    they follow. Leftovers fill extra trips of [`SPILL_TRIP_LEN`]
//!    customers.
//! 5. While there are fewer trips than required, bisect the trip with the
//!    most customers (first one on ties).
//!
//! Inheriting the trip layout from the template keeps a child's vehicle
//! structure close to its parent even when the trip contents change.

use serde::{Deserialize, Serialize};

use crate::models::{ProblemInstance, Route};

/// Customers per extra trip when the template's trips are used up.
pub const SPILL_TRIP_LEN: usize = 10;

/// Parameters shared by every repair call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairOptions {
    /// Minimum number of vehicle trips.
    pub min_trips: usize,
    /// Whether station ids carried by the candidate survive structural repair.
    ///
    /// Resource repair inserts stations where the battery needs them
    /// regardless of this flag.
    pub stations_allowed: bool,
}

impl RepairOptions {
    /// Creates repair options.
    pub fn new(min_trips: usize, stations_allowed: bool) -> Self {
        Self {
            min_trips,
            stations_allowed,
        }
    }
}

/// Rebuilds `candidate` into a structurally valid route using `template`'s
/// trip layout.
///
/// The result starts and ends at the depot, has no empty trips, serves
/// every customer exactly once, and has at least `min_trips` trips unless
/// the instance has fewer customers than that. Cargo and battery are not
/// considered here.
///
/// # Examples
///
/// ```
/// use evrp_ga::models::{ProblemInstance, Route};
/// use evrp_ga::repair::{repair_structure, RepairOptions};
///
/// let instance = ProblemInstance::builder(5)
///     .capacity(10)
///     .energy(100.0, 1.0)
///     .depot(0.0, 0.0)
///     .customer(2, 1.0, 0.0, 1)
///     .customer(3, 2.0, 0.0, 1)
///     .customer(4, 3.0, 0.0, 1)
///     .customer(5, 4.0, 0.0, 1)
///     .build()
///     .unwrap();
///
/// let template = Route::new(vec![1, 2, 3, 1, 4, 5, 1]);
/// let child = Route::new(vec![1, 5, 5, 4, 1, 1, 2]);
/// let fixed = repair_structure(&child, &template, &instance, RepairOptions::new(2, false));
/// assert_eq!(fixed.nodes(), &[1, 5, 4, 1, 2, 3, 1]);
/// ```
pub fn repair_structure(
    candidate: &Route,
    template: &Route,
    instance: &ProblemInstance,
    options: RepairOptions,
) -> Route {
    let genes = collect_genes(candidate, template, instance, options.stations_allowed);

    let quotas: Vec<usize> = template
        .trips()
        .iter()
        .map(|trip| trip.iter().filter(|&&n| instance.is_customer(n)).count())
        .filter(|&q| q > 0)
        .collect();

    let mut trips = distribute(&genes, &quotas, instance);
    bisect_until(&mut trips, options.min_trips, instance);
    Route::from_trips(&trips)
}

fn collect_genes(
    candidate: &Route,
    template: &Route,
    instance: &ProblemInstance,
    stations_allowed: bool,
) -> Vec<usize> {
    let mut served = vec![false; instance.dimension() + 1];
    let mut genes = Vec::with_capacity(candidate.len());

    for &node in candidate.nodes() {
        if instance.is_customer(node) {
            if !served[node] {
                served[node] = true;
                genes.push(node);
            }
        } else if stations_allowed && instance.is_station(node) {
            genes.push(node);
        }
    }

    for &node in template.nodes() {
        if instance.is_customer(node) && !served[node] {
            served[node] = true;
            genes.push(node);
        }
    }
    for customer in instance.customers() {
        if !served[customer] {
            served[customer] = true;
            genes.push(customer);
        }
    }

    genes
}

fn distribute(genes: &[usize], quotas: &[usize], instance: &ProblemInstance) -> Vec<Vec<usize>> {
    let mut quotas = quotas.iter().copied();
    let mut quota = quotas.next().unwrap_or(SPILL_TRIP_LEN);
    let mut trips = Vec::new();
    let mut current = Vec::new();
    let mut served = 0;

    for &gene in genes {
        if instance.is_customer(gene) {
            if served == quota {
                trips.push(std::mem::take(&mut current));
                served = 0;
                quota = quotas.next().unwrap_or(SPILL_TRIP_LEN);
            }
            served += 1;
        }
        current.push(gene);
    }
    if !current.is_empty() {
        trips.push(current);
    }
    trips
}

fn bisect_until(trips: &mut Vec<Vec<usize>>, min_trips: usize, instance: &ProblemInstance) {
    let customers_in = |trip: &Vec<usize>| trip.iter().filter(|&&n| instance.is_customer(n)).count();

    while trips.len() < min_trips {
        let mut longest = 0;
        let mut longest_count = 0;
        for (idx, trip) in trips.iter().enumerate() {
            let count = customers_in(trip);
            if count > longest_count {
                longest = idx;
                longest_count = count;
            }
        }
        if longest_count < 2 {
            break;
        }

        // Split before the customer that opens the second half.
        let target = longest_count / 2;
        let mut seen = 0;
        let cut = trips[longest]
            .iter()
            .position(|&n| {
                if instance.is_customer(n) {
                    seen += 1;
                }
                seen > target
            })
            .unwrap_or(trips[longest].len());
        let tail = trips[longest].split_off(cut);
        trips.insert(longest + 1, tail);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n_customers: usize) -> ProblemInstance {
        let mut b = ProblemInstance::builder(n_customers + 1)
            .vehicles(2)
            .capacity(100)
            .energy(1000.0, 1.0)
            .depot(0.0, 0.0);
        for id in 2..=n_customers + 1 {
            b = b.customer(id, id as f64, 0.0, 1);
        }
        b.station(n_customers + 2, 0.0, 5.0).build().expect("valid")
    }

    #[test]
    fn test_forces_depot_boundaries() {
        let inst = line(3);
        let template = Route::new(vec![1, 2, 3, 4, 1]);
        let out = repair_structure(
            &Route::new(vec![3, 2, 4]),
            &template,
            &inst,
            RepairOptions::new(1, false),
        );
        assert_eq!(out.nodes(), &[1, 3, 2, 4, 1]);
    }

    #[test]
    fn test_drops_invalid_and_duplicate_nodes() {
        let inst = line(3);
        let template = Route::new(vec![1, 2, 3, 4, 1]);
        let out = repair_structure(
            &Route::new(vec![1, 0, 4, 99, 4, 2, 1, 1, 3, 1]),
            &template,
            &inst,
            RepairOptions::new(1, false),
        );
        assert_eq!(out.nodes(), &[1, 4, 2, 3, 1]);
    }

    #[test]
    fn test_missing_customers_follow_template_order() {
        let inst = line(4);
        let template = Route::new(vec![1, 5, 3, 1, 2, 4, 1]);
        let out = repair_structure(
            &Route::new(vec![1, 4, 1]),
            &template,
            &inst,
            RepairOptions::new(1, false),
        );
        assert_eq!(out.nodes(), &[1, 4, 5, 1, 3, 2, 1]);
    }

    #[test]
    fn test_customers_missing_from_template_appended_by_id() {
        let inst = line(3);
        let template = Route::new(vec![1, 3, 1]);
        let out = repair_structure(
            &Route::new(vec![1, 3, 1]),
            &template,
            &inst,
            RepairOptions::new(1, false),
        );
        // quota of 1 from the template, then a spill trip
        assert_eq!(out.nodes(), &[1, 3, 1, 2, 4, 1]);
    }

    #[test]
    fn test_spill_trips_capped() {
        let inst = line(25);
        let template = Route::new(vec![1, 2, 1]);
        let candidate = Route::new((1..=26).chain(std::iter::once(1)).collect());
        let out = repair_structure(&candidate, &template, &inst, RepairOptions::new(1, false));
        let sizes: Vec<usize> = out.trips().iter().map(|t| t.len()).collect();
        assert_eq!(sizes, vec![1, 10, 10, 4]);
    }

    #[test]
    fn test_bisects_longest_trip() {
        let inst = line(5);
        let template = Route::new(vec![1, 2, 3, 4, 5, 6, 1]);
        let out = repair_structure(
            &template.clone(),
            &template,
            &inst,
            RepairOptions::new(3, false),
        );
        // [2,3,4,5,6] -> [2,3] [4,5,6] -> [2,3] [4] [5,6]
        assert_eq!(out.nodes(), &[1, 2, 3, 1, 4, 1, 5, 6, 1]);
    }

    #[test]
    fn test_bisection_stops_at_singletons() {
        let inst = line(2);
        let template = Route::new(vec![1, 2, 3, 1]);
        let out = repair_structure(&template, &template, &inst, RepairOptions::new(5, false));
        assert_eq!(out.nodes(), &[1, 2, 1, 3, 1]);
    }

    #[test]
    fn test_stations_dropped_when_disallowed() {
        let inst = line(2);
        let station = 4;
        let template = Route::new(vec![1, 2, 3, 1]);
        let out = repair_structure(
            &Route::new(vec![1, 2, station, 3, 1]),
            &template,
            &inst,
            RepairOptions::new(1, false),
        );
        assert_eq!(out.nodes(), &[1, 2, 3, 1]);
    }

    #[test]
    fn test_stations_ride_with_their_trip() {
        let inst = line(4);
        let station = 6;
        let template = Route::new(vec![1, 2, 3, 1, 4, 5, 1]);
        let out = repair_structure(
            &Route::new(vec![1, 2, 3, station, 1, 4, station, 5, 1]),
            &template,
            &inst,
            RepairOptions::new(1, true),
        );
        assert_eq!(out.nodes(), &[1, 2, 3, station, 1, 4, station, 5, 1]);
    }
}
