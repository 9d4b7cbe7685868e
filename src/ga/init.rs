//! Random initial routes.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{ProblemInstance, Route};

/// Extra trips beyond the minimum a random route may be dealt into.
const EXTRA_TRIPS: usize = 3;

/// Creates a random, not necessarily feasible, route.
///
/// Customers (and stations, when allowed) are shuffled and dealt
/// round-robin into between `min_trips` and `min_trips + 3` trips. Callers
/// repair the result before putting it into a population.
///
/// # Examples
///
/// ```
/// use evrp_ga::ga::random_route;
/// use evrp_ga::models::ProblemInstance;
/// use rand::SeedableRng;
///
/// let instance = ProblemInstance::builder(4)
///     .capacity(10)
///     .energy(100.0, 1.0)
///     .depot(0.0, 0.0)
///     .customer(2, 1.0, 0.0, 1)
///     .customer(3, 2.0, 0.0, 1)
///     .customer(4, 3.0, 0.0, 1)
///     .build()
///     .unwrap();
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
/// let route = random_route(&instance, 1, false, &mut rng);
/// let mut genes = route.genes();
/// genes.sort();
/// assert_eq!(genes, vec![2, 3, 4]);
/// ```
pub fn random_route<R: Rng>(
    instance: &ProblemInstance,
    min_trips: usize,
    stations_allowed: bool,
    rng: &mut R,
) -> Route {
    let mut genes: Vec<usize> = instance.customers().collect();
    if stations_allowed {
        genes.extend_from_slice(instance.stations());
    }
    genes.shuffle(rng);

    let min_trips = min_trips.max(1);
    let num_trips = rng.random_range(min_trips..=min_trips + EXTRA_TRIPS);
    let trips: Vec<Vec<usize>> = (0..num_trips)
        .map(|t| genes.iter().skip(t).step_by(num_trips).copied().collect())
        .collect();

    Route::from_trips(&trips)
}

/// One trip per customer, in id order.
///
/// Starting point when random routes keep failing repair.
pub fn singleton_route(instance: &ProblemInstance) -> Route {
    let trips: Vec<[usize; 1]> = instance.customers().map(|c| [c]).collect();
    Route::from_trips(&trips)
}
