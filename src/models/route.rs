//! Route chromosome.

use serde::{Deserialize, Serialize};

use super::DEPOT;

/// An ordered sequence of node ids for the whole fleet.
///
/// A valid route starts and ends at the depot; every internal depot visit
/// closes one vehicle trip and opens the next. The route is the GA
/// chromosome and also the key of a fitness map, so equality and hashing
/// follow the node sequence.
///
/// # Examples
///
/// ```
/// use evrp_ga::models::Route;
///
/// let route = Route::new(vec![1, 2, 3, 1, 4, 1]);
/// assert_eq!(route.num_trips(), 2);
/// assert_eq!(route.trips()[0], &[2, 3]);
/// assert_eq!(route.trips()[1], &[4]);
/// assert_eq!(route.genes(), vec![2, 3, 4]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route {
    nodes: Vec<usize>,
}

impl Route {
    /// Wraps a node sequence. No validation is performed.
    pub fn new(nodes: Vec<usize>) -> Self {
        Self { nodes }
    }

    /// Builds `[1, t0.., 1, t1.., 1, ...]` from trip contents.
    ///
    /// Empty trips are skipped so the result never has consecutive depots.
    pub fn from_trips<T: AsRef<[usize]>>(trips: &[T]) -> Self {
        let mut nodes = vec![DEPOT];
        for trip in trips {
            let trip = trip.as_ref();
            if trip.is_empty() {
                continue;
            }
            nodes.extend_from_slice(trip);
            nodes.push(DEPOT);
        }
        Self { nodes }
    }

    /// The node sequence.
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    /// Consumes the route, returning the node sequence.
    pub fn into_nodes(self) -> Vec<usize> {
        self.nodes
    }

    /// Number of node visits including depot markers.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Trip contents: maximal non-empty runs between depot markers.
    pub fn trips(&self) -> Vec<&[usize]> {
        self.nodes
            .split(|&n| n == DEPOT)
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Number of vehicle trips.
    pub fn num_trips(&self) -> usize {
        self.trips().len()
    }

    /// Non-depot nodes in visit order (customers and stations).
    pub fn genes(&self) -> Vec<usize> {
        self.nodes.iter().copied().filter(|&n| n != DEPOT).collect()
    }

    /// Positions of non-depot nodes.
    pub fn gene_positions(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|&(_, &n)| n != DEPOT)
            .map(|(i, _)| i)
            .collect()
    }

    /// Returns a copy with the non-depot slots filled from `genes`, in order.
    ///
    /// Depot markers keep their positions. `genes` must have exactly one
    /// entry per non-depot slot.
    pub fn with_genes(&self, genes: &[usize]) -> Self {
        let mut nodes = self.nodes.clone();
        for (slot, &gene) in self.gene_positions().into_iter().zip(genes) {
            nodes[slot] = gene;
        }
        Self { nodes }
    }
}

impl From<Vec<usize>> for Route {
    fn from(nodes: Vec<usize>) -> Self {
        Self::new(nodes)
    }
}
