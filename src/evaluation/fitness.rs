//! Fitness strategies and the per-generation fitness map.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{ProblemInstance, Route};

use super::simulate::RouteChecker;

/// Added to the distance before inversion so a zero-length route stays finite.
pub const DISTANCE_EPSILON: f64 = 1e-6;

/// Mapping from a route (by node sequence) to its fitness. Higher is better.
///
/// Identical routes share one entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitnessMap {
    values: HashMap<Route, f64>,
}

impl FitnessMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fitness of a route.
    pub fn insert(&mut self, route: Route, fitness: f64) {
        self.values.insert(route, fitness);
    }

    /// Fitness of a route, if evaluated.
    pub fn get(&self, route: &Route) -> Option<f64> {
        self.values.get(route).copied()
    }

    /// Fitness of a route, or 0.0 for routes that were never evaluated.
    pub fn fitness_of(&self, route: &Route) -> f64 {
        self.get(route).unwrap_or(0.0)
    }

    /// Number of distinct routes.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing was evaluated.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of all fitness values.
    pub fn total(&self) -> f64 {
        self.values.values().sum()
    }

    /// Iterates over `(route, fitness)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&Route, f64)> {
        self.values.iter().map(|(r, &f)| (r, f))
    }
}

/// Total travelled distance of a route.
///
/// Infinite if the route visits an id the instance does not define.
pub fn route_distance(route: &Route, instance: &ProblemInstance) -> f64 {
    if route.nodes().iter().any(|&n| instance.node(n).is_none()) {
        return f64::INFINITY;
    }
    instance.distances().path_length(route.nodes())
}

fn default_penalty() -> f64 {
    1000.0
}

/// How routes are scored.
///
/// # Examples
///
/// ```
/// use evrp_ga::models::{ProblemInstance, Route};
/// use evrp_ga::evaluation::Evaluation;
///
/// let instance = ProblemInstance::builder(3)
///     .capacity(10)
///     .energy(100.0, 1.0)
///     .depot(0.0, 0.0)
///     .customer(2, 3.0, 4.0, 4)
///     .customer(3, 6.0, 8.0, 4)
///     .build()
///     .unwrap();
///
/// let short = Route::new(vec![1, 2, 3, 1]);
/// let long = Route::new(vec![1, 3, 1, 2, 1]);
/// let fitness = Evaluation::Distance.evaluate(&[short.clone(), long.clone()], &instance, 1);
/// assert!(fitness.fitness_of(&short) > fitness.fitness_of(&long));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Evaluation {
    /// `1 / (distance + ε)`.
    Distance,
    /// `1 / (distance + penalty × violations + ε)`.
    ///
    /// Violations counted: missing or duplicate customers, over-capacity
    /// trips, battery-depleted legs, and fewer trips than `min_trips`.
    Penalized {
        #[serde(default = "default_penalty")]
        penalty: f64,
    },
    /// `(N − rank)²` by ascending distance, normalized to sum to 1.
    Rank,
}

impl Default for Evaluation {
    fn default() -> Self {
        Self::Distance
    }
}

impl Evaluation {
    /// Penalized evaluation with the default penalty of 1000.
    pub fn penalized() -> Self {
        Self::Penalized {
            penalty: default_penalty(),
        }
    }

    /// Short name for logs and event records.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Distance => "distance",
            Self::Penalized { .. } => "penalized",
            Self::Rank => "rank",
        }
    }

    /// Scores every route of `population`. Routes are not modified.
    ///
    /// `min_trips` is the trip minimum penalized routes are checked against;
    /// pass the one repair works with.
    pub fn evaluate(
        &self,
        population: &[Route],
        instance: &ProblemInstance,
        min_trips: usize,
    ) -> FitnessMap {
        match *self {
            Self::Distance => {
                let mut map = FitnessMap::new();
                for route in population {
                    let d = route_distance(route, instance);
                    map.insert(route.clone(), 1.0 / (d + DISTANCE_EPSILON));
                }
                map
            }
            Self::Penalized { penalty } => {
                let checker = RouteChecker::new(instance);
                let mut map = FitnessMap::new();
                for route in population {
                    let violations = checker.validate(route, min_trips).len();
                    let cost = route_distance(route, instance) + penalty * violations as f64;
                    map.insert(route.clone(), 1.0 / (cost + DISTANCE_EPSILON));
                }
                map
            }
            Self::Rank => rank_fitness(population, instance),
        }
    }
}

fn rank_fitness(population: &[Route], instance: &ProblemInstance) -> FitnessMap {
    // Distinct routes in first-occurrence order so ties keep population order.
    let mut distinct: Vec<(&Route, f64)> = Vec::with_capacity(population.len());
    for route in population {
        if !distinct.iter().any(|(r, _)| *r == route) {
            distinct.push((route, route_distance(route, instance)));
        }
    }
    distinct.sort_by(|a, b| a.1.total_cmp(&b.1));

    let n = distinct.len();
    let raw: Vec<f64> = (0..n).map(|rank| ((n - rank) as f64).powi(2)).collect();
    let total: f64 = raw.iter().sum();

    let mut map = FitnessMap::new();
    for ((route, _), score) in distinct.into_iter().zip(raw) {
        let value = if total > 0.0 { score / total } else { score };
        map.insert(route.clone(), value);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> ProblemInstance {
        ProblemInstance::builder(4)
            .vehicles(1)
            .capacity(10)
            .energy(100.0, 1.0)
            .depot(0.0, 0.0)
            .customer(2, 1.0, 0.0, 4)
            .customer(3, 2.0, 0.0, 4)
            .customer(4, 3.0, 0.0, 4)
            .build()
            .expect("valid")
    }

    #[test]
    fn test_route_distance() {
        let inst = setup();
        let d = route_distance(&Route::new(vec![1, 2, 3, 1, 4, 1]), &inst);
        // 1+1+2 + 3+3
        assert!((d - 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_distance_fitness_inverse() {
        let inst = setup();
        let r = Route::new(vec![1, 2, 3, 1, 4, 1]);
        let map = Evaluation::Distance.evaluate(std::slice::from_ref(&r), &inst, 1);
        assert!((map.fitness_of(&r) - 1.0 / (10.0 + DISTANCE_EPSILON)).abs() < 1e-12);
    }

    #[test]
    fn test_distance_fitness_strictly_decreasing() {
        let inst = setup();
        let a = Route::new(vec![1, 2, 3, 1, 4, 1]); // 10
        let b = Route::new(vec![1, 2, 1, 3, 1, 4, 1]); // 12
        let c = Route::new(vec![1, 4, 1, 2, 1, 3, 1]); // 12, other order
        let d = Route::new(vec![1, 4, 2, 1, 3, 1]); // 3+2+1+2+2 = 10
        let e = Route::new(vec![1, 3, 1, 4, 2, 1]); // 2+2+3+2+1 = 10
        let f = Route::new(vec![1, 4, 2, 3, 1]); // 3+2+1+2 = 8
        let pop = vec![a.clone(), b.clone(), c, d, e, f.clone()];
        let map = Evaluation::Distance.evaluate(&pop, &inst, 1);
        assert!(map.fitness_of(&f) > map.fitness_of(&a));
        assert!(map.fitness_of(&a) > map.fitness_of(&b));
    }

    #[test]
    fn test_penalized_scores_violations_worse() {
        let inst = setup();
        let ok = Route::new(vec![1, 2, 3, 1, 4, 1]);
        let over = Route::new(vec![1, 2, 3, 4, 1]); // load 12, shorter
        let map = Evaluation::penalized().evaluate(&[ok.clone(), over.clone()], &inst, 1);
        assert!(map.fitness_of(&ok) > map.fitness_of(&over));
        // 1 / (6 + 1000)
        assert!((map.fitness_of(&over) - 1.0 / (1006.0 + DISTANCE_EPSILON)).abs() < 1e-12);
    }

    #[test]
    fn test_penalized_uses_given_trip_minimum() {
        let inst = ProblemInstance::builder(3)
            .vehicles(2)
            .capacity(10)
            .energy(100.0, 1.0)
            .depot(0.0, 0.0)
            .customer(2, 1.0, 0.0, 4)
            .customer(3, 2.0, 0.0, 4)
            .build()
            .expect("valid");
        let single = Route::new(vec![1, 2, 3, 1]); // 4
        let one = Evaluation::penalized().evaluate(std::slice::from_ref(&single), &inst, 1);
        assert!((one.fitness_of(&single) - 1.0 / (4.0 + DISTANCE_EPSILON)).abs() < 1e-12);
        let two = Evaluation::penalized().evaluate(std::slice::from_ref(&single), &inst, 2);
        assert!((two.fitness_of(&single) - 1.0 / (1004.0 + DISTANCE_EPSILON)).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_node_scores_zero() {
        let inst = setup();
        let bad = Route::new(vec![1, 2, 3, 42, 4, 1]);
        assert_eq!(route_distance(&bad, &inst), f64::INFINITY);
        for method in [Evaluation::Distance, Evaluation::penalized()] {
            let map = method.evaluate(std::slice::from_ref(&bad), &inst, 1);
            assert_eq!(map.fitness_of(&bad), 0.0, "{}", method.name());
        }
        let ok = Route::new(vec![1, 2, 3, 1, 4, 1]);
        let ranked = Evaluation::Rank.evaluate(&[bad.clone(), ok.clone()], &inst, 1);
        assert!(ranked.fitness_of(&ok) > ranked.fitness_of(&bad));
    }

    #[test]
    fn test_rank_sums_to_one() {
        let inst = setup();
        let pop = vec![
            Route::new(vec![1, 2, 3, 1, 4, 1]),
            Route::new(vec![1, 2, 1, 3, 1, 4, 1]),
            Route::new(vec![1, 4, 2, 3, 1]),
        ];
        let map = Evaluation::Rank.evaluate(&pop, &inst, 1);
        assert!((map.total() - 1.0).abs() < 1e-12);
        // best of 3: 9/14, then 4/14, then 1/14
        assert!((map.fitness_of(&pop[2]) - 9.0 / 14.0).abs() < 1e-12);
        assert!((map.fitness_of(&pop[0]) - 4.0 / 14.0).abs() < 1e-12);
        assert!((map.fitness_of(&pop[1]) - 1.0 / 14.0).abs() < 1e-12);
    }

    #[test]
    fn test_rank_ties_keep_population_order() {
        let inst = setup();
        let a = Route::new(vec![1, 2, 3, 1, 4, 1]); // 10
        let b = Route::new(vec![1, 4, 2, 1, 3, 1]); // 10
        let map = Evaluation::Rank.evaluate(&[a.clone(), b.clone()], &inst, 1);
        assert!(map.fitness_of(&a) > map.fitness_of(&b));
    }

    #[test]
    fn test_duplicates_share_entry() {
        let inst = setup();
        let a = Route::new(vec![1, 2, 3, 1, 4, 1]);
        let map = Evaluation::Rank.evaluate(&[a.clone(), a.clone()], &inst, 1);
        assert_eq!(map.len(), 1);
        assert!((map.fitness_of(&a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_serde_tagged() {
        let json = serde_json::to_string(&Evaluation::Rank).expect("serialize");
        assert_eq!(json, r#"{"method":"rank"}"#);
        let parsed: Evaluation =
            serde_json::from_str(r#"{"method":"penalized"}"#).expect("deserialize");
        assert_eq!(parsed, Evaluation::Penalized { penalty: 1000.0 });
    }
}
