//! Mutation operators.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::local_search::improve_charge_segments;
use crate::models::{ProblemInstance, Route};
use crate::repair::FeasibilityRepairer;

/// Mutation operator. All operators move genes between non-depot slots, so
/// depot markers keep their positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Mutation {
    /// Exchange two genes.
    #[default]
    Swap,
    /// Reverse a random gene segment.
    Inversion,
    /// Shuffle a random gene segment.
    Scramble,
    /// Move one gene to another position.
    Insertion,
    /// Pick a random gene, draw a customer from its nearest-neighbour
    /// priorities, and move that customer right behind it.
    NearestNeighbor,
    /// 2-opt on every run of customers between depot and station visits.
    /// Never lengthens the route.
    TwoOpt,
}

impl Mutation {
    /// Short name for logs and event records.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Swap => "swap",
            Self::Inversion => "inversion",
            Self::Scramble => "scramble",
            Self::Insertion => "insertion",
            Self::NearestNeighbor => "nearest_neighbor",
            Self::TwoOpt => "two_opt",
        }
    }

    /// Applies the operator to a copy of `route`.
    ///
    /// Routes with fewer than two genes are returned unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use evrp_ga::ga::Mutation;
    /// use evrp_ga::models::{ProblemInstance, Route};
    /// use rand::SeedableRng;
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
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(4);
    /// let route = Route::new(vec![1, 2, 3, 1, 4, 5, 1]);
    /// let mutated = Mutation::Inversion.apply(&route, &instance, &mut rng);
    /// assert_eq!(mutated.nodes()[3], 1);
    /// assert_eq!(mutated.len(), route.len());
    /// ```
    pub fn apply<R: Rng>(&self, route: &Route, instance: &ProblemInstance, rng: &mut R) -> Route {
        if let Self::TwoOpt = self {
            return improve_charge_segments(route, instance);
        }

        let mut genes = route.genes();
        let n = genes.len();
        if n < 2 {
            return route.clone();
        }

        match self {
            Self::Swap => {
                let i = rng.random_range(0..n);
                let mut j = rng.random_range(0..n - 1);
                if j >= i {
                    j += 1;
                }
                genes.swap(i, j);
            }
            Self::Inversion => {
                let (lo, hi) = segment(n, rng);
                genes[lo..hi].reverse();
            }
            Self::Scramble => {
                let (lo, hi) = segment(n, rng);
                genes[lo..hi].shuffle(rng);
            }
            Self::Insertion => {
                let from = rng.random_range(0..n);
                let gene = genes.remove(from);
                let mut to = rng.random_range(0..n - 1);
                if to >= from {
                    to += 1;
                }
                genes.insert(to, gene);
            }
            Self::NearestNeighbor => {
                let anchor = genes[rng.random_range(0..n)];
                if let Some(near) = instance.priorities().choose(anchor, rng) {
                    if let Some(from) = genes.iter().position(|&g| g == near) {
                        genes.remove(from);
                        let at = genes.iter().position(|&g| g == anchor).map_or(0, |p| p + 1);
                        genes.insert(at, near);
                    }
                }
            }
            Self::TwoOpt => {}
        }
        route.with_genes(&genes)
    }

    /// Mutates each child with probability `rate`.
    ///
    /// A mutated child is repaired with its pre-mutation self as template;
    /// if it is still infeasible the original is kept.
    pub fn mutate<R: Rng>(
        &self,
        children: &[Route],
        repairer: &FeasibilityRepairer<'_>,
        rate: f64,
        rng: &mut R,
    ) -> Vec<Route> {
        let rate = rate.clamp(0.0, 1.0);
        children
            .iter()
            .map(|child| {
                if !rng.random_bool(rate) {
                    return child.clone();
                }
                let mutant = self.apply(child, repairer.instance(), rng);
                let repaired = repairer.repair(&mutant, child);
                if repairer.is_feasible(&repaired) {
                    repaired
                } else {
                    child.clone()
                }
            })
            .collect()
    }
}

/// Random half-open segment `[lo, hi)` of at least two genes.
fn segment<R: Rng>(n: usize, rng: &mut R) -> (usize, usize) {
    let lo = rng.random_range(0..n - 1);
    let hi = rng.random_range(lo + 2..=n);
    (lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::route_distance;
    use crate::repair::RepairOptions;
    use rand::SeedableRng;

    const ALL: [Mutation; 6] = [
        Mutation::Swap,
        Mutation::Inversion,
        Mutation::Scramble,
        Mutation::Insertion,
        Mutation::NearestNeighbor,
        Mutation::TwoOpt,
    ];

    fn setup() -> ProblemInstance {
        let mut b = ProblemInstance::builder(7)
            .vehicles(2)
            .capacity(10)
            .energy(100.0, 1.0)
            .depot(0.0, 0.0);
        for id in 2..=7 {
            b = b.customer(id, id as f64, 0.0, 3);
        }
        b.build().expect("valid")
    }

    #[test]
    fn test_operators_preserve_genes_and_depots() {
        let inst = setup();
        let route = Route::new(vec![1, 2, 3, 4, 1, 5, 6, 7, 1]);
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        for op in ALL {
            for _ in 0..20 {
                let out = op.apply(&route, &inst, &mut rng);
                assert_eq!(out.gene_positions(), route.gene_positions());
                let mut genes = out.genes();
                genes.sort_unstable();
                assert_eq!(genes, vec![2, 3, 4, 5, 6, 7], "{}", op.name());
            }
        }
    }

    #[test]
    fn test_swap_changes_route() {
        let inst = setup();
        let route = Route::new(vec![1, 2, 3, 1]);
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        assert_eq!(Mutation::Swap.apply(&route, &inst, &mut rng).nodes(), &[1, 3, 2, 1]);
    }

    #[test]
    fn test_single_gene_untouched() {
        let inst = setup();
        let route = Route::new(vec![1, 2, 1]);
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        for op in ALL {
            assert_eq!(op.apply(&route, &inst, &mut rng), route);
        }
    }

    #[test]
    fn test_nearest_neighbor_moves_customer_behind_anchor() {
        let inst = setup();
        let route = Route::new(vec![1, 7, 3, 5, 1, 2, 6, 4, 1]);
        let mut rng = rand::rngs::StdRng::seed_from_u64(11);
        let mut moved = 0;
        for _ in 0..50 {
            let out = Mutation::NearestNeighbor.apply(&route, &inst, &mut rng);
            if out == route {
                continue;
            }
            moved += 1;
            // exactly one gene was relocated, so some pair of
            // neighbouring genes now holds a priority candidate
            let genes = out.genes();
            assert!(genes
                .windows(2)
                .any(|w| inst.priorities().candidates(w[0]).contains(&w[1])));
        }
        assert!(moved > 0);
    }

    #[test]
    fn test_two_opt_never_lengthens() {
        let inst = setup();
        let mut rng = rand::rngs::StdRng::seed_from_u64(2);
        for route in [
            Route::new(vec![1, 4, 2, 3, 1, 7, 5, 6, 1]),
            Route::new(vec![1, 7, 2, 6, 3, 1, 5, 4, 1]),
        ] {
            let out = Mutation::TwoOpt.apply(&route, &inst, &mut rng);
            assert!(route_distance(&out, &inst) <= route_distance(&route, &inst) + 1e-10);
            assert_eq!(out.gene_positions(), route.gene_positions());
        }
        // 4+2+1+3 down to 8, the optimum for this trip
        let out = Mutation::TwoOpt.apply(&Route::new(vec![1, 4, 2, 3, 1]), &inst, &mut rng);
        assert!((route_distance(&out, &inst) - 8.0).abs() < 1e-10);
    }

    #[test]
    fn test_zero_rate_is_identity() {
        let inst = setup();
        let repairer = FeasibilityRepairer::new(&inst, RepairOptions::new(2, false));
        let children = vec![Route::new(vec![1, 2, 3, 4, 1, 5, 6, 7, 1])];
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        assert_eq!(Mutation::Swap.mutate(&children, &repairer, 0.0, &mut rng), children);
    }

    #[test]
    fn test_mutated_children_stay_feasible() {
        let inst = setup();
        let repairer = FeasibilityRepairer::new(&inst, RepairOptions::new(2, false));
        let children = vec![
            Route::new(vec![1, 2, 3, 4, 1, 5, 6, 7, 1]),
            Route::new(vec![1, 7, 6, 5, 1, 4, 3, 2, 1]),
        ];
        let mut rng = rand::rngs::StdRng::seed_from_u64(5);
        for op in ALL {
            let out = op.mutate(&children, &repairer, 1.0, &mut rng);
            assert_eq!(out.len(), 2);
            assert!(out.iter().all(|r| repairer.is_feasible(r)));
        }
    }
}
