//! Nearest-neighbour priorities over customers.

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;

use super::DistanceMatrix;

/// Offset that keeps inverse-distance weights finite for coincident nodes.
const WEIGHT_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Default)]
struct PriorityRow {
    customers: Vec<usize>,
    weights: Vec<f64>,
    sampler: Option<WeightedIndex<f64>>,
}

/// For every node, the customers ordered by distance together with
/// `1 / (distance + 1e-6)` selection weights.
///
/// # Examples
///
/// ```
/// use evrp_ga::models::Node;
/// use evrp_ga::distance::{DistanceMatrix, PriorityMatrix};
///
/// let nodes = vec![
///     Node::depot(0.0, 0.0),
///     Node::customer(2, 3.0, 0.0, 1),
///     Node::customer(3, 1.0, 0.0, 1),
/// ];
/// let dm = DistanceMatrix::from_nodes(&nodes);
/// let pm = PriorityMatrix::new(&dm, &[1, 2, 3], &[2, 3]);
/// assert_eq!(pm.candidates(1), &[3, 2]);
/// assert_eq!(pm.candidates(2), &[3]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PriorityMatrix {
    rows: Vec<PriorityRow>,
}

impl PriorityMatrix {
    /// Builds rows for every id in `origins` over the given `customers`.
    ///
    /// A node never lists itself. Equal distances keep `customers` order.
    pub fn new(distances: &DistanceMatrix, origins: &[usize], customers: &[usize]) -> Self {
        let size = origins.iter().copied().max().map_or(0, |m| m + 1);
        let mut rows = vec![PriorityRow::default(); size];
        for &from in origins {
            let mut ranked: Vec<(usize, f64)> = customers
                .iter()
                .copied()
                .filter(|&c| c != from)
                .map(|c| (c, distances.get(from, c)))
                .collect();
            ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

            let weights: Vec<f64> = ranked
                .iter()
                .map(|&(_, d)| 1.0 / (d + WEIGHT_EPSILON))
                .collect();
            rows[from] = PriorityRow {
                customers: ranked.into_iter().map(|(c, _)| c).collect(),
                sampler: WeightedIndex::new(&weights).ok(),
                weights,
            };
        }
        Self { rows }
    }

    /// Customers ordered from nearest to farthest. Empty for unknown ids.
    pub fn candidates(&self, from: usize) -> &[usize] {
        self.rows
            .get(from)
            .map(|r| r.customers.as_slice())
            .unwrap_or_default()
    }

    /// Selection weights matching [`candidates`](Self::candidates).
    pub fn weights(&self, from: usize) -> &[f64] {
        self.rows
            .get(from)
            .map(|r| r.weights.as_slice())
            .unwrap_or_default()
    }

    /// Draws a customer with probability proportional to its weight.
    ///
    /// Returns `None` when `from` has no candidates.
    pub fn choose<R: Rng>(&self, from: usize, rng: &mut R) -> Option<usize> {
        let row = self.rows.get(from)?;
        let sampler = row.sampler.as_ref()?;
        row.customers.get(sampler.sample(rng)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Node;
    use rand::SeedableRng;

    fn setup() -> PriorityMatrix {
        let nodes = vec![
            Node::depot(0.0, 0.0),
            Node::customer(2, 1.0, 0.0, 1),
            Node::customer(3, -3.0, 0.0, 1),
            Node::station(4, 0.0, 2.0),
        ];
        let dm = DistanceMatrix::from_nodes(&nodes);
        PriorityMatrix::new(&dm, &[1, 2, 3, 4], &[2, 3])
    }

    #[test]
    fn test_rows_sorted_by_distance() {
        let pm = setup();
        assert_eq!(pm.candidates(1), &[2, 3]);
        assert_eq!(pm.candidates(4), &[2, 3]);
        assert_eq!(pm.candidates(3), &[2]);
        assert!(pm.candidates(99).is_empty());
    }

    #[test]
    fn test_inverse_distance_weights() {
        let pm = setup();
        let w = pm.weights(1);
        assert!((w[0] - 1.0 / (1.0 + WEIGHT_EPSILON)).abs() < 1e-12);
        assert!((w[1] - 1.0 / (3.0 + WEIGHT_EPSILON)).abs() < 1e-12);
    }

    #[test]
    fn test_choose_favours_nearest() {
        let pm = setup();
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let draws = 20_000;
        let near = (0..draws)
            .filter(|_| pm.choose(1, &mut rng) == Some(2))
            .count();
        // weights 1 : 1/3
        let freq = near as f64 / draws as f64;
        assert!((freq - 0.75).abs() < 0.02, "freq {freq}");
    }

    #[test]
    fn test_choose_without_candidates() {
        let nodes = vec![Node::depot(0.0, 0.0), Node::customer(2, 1.0, 0.0, 1)];
        let dm = DistanceMatrix::from_nodes(&nodes);
        let pm = PriorityMatrix::new(&dm, &[1, 2], &[2]);
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        assert_eq!(pm.choose(2, &mut rng), None);
        assert_eq!(pm.choose(1, &mut rng), Some(2));
    }
}
