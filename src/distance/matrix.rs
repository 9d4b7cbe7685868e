//! Dense distance matrix indexed by node id.

use crate::models::Node;

/// A dense n×n distance matrix stored in row-major order.
///
/// Rows and columns are node ids, so the matrix is sized `max_id + 1`
/// and slots of ids that do not exist in the instance stay at zero.
///
/// # Examples
///
/// ```
/// use evrp_ga::models::Node;
/// use evrp_ga::distance::DistanceMatrix;
///
/// let nodes = vec![
///     Node::depot(0.0, 0.0),
///     Node::customer(2, 3.0, 4.0, 10),
///     Node::station(7, 6.0, 8.0),
/// ];
/// let dm = DistanceMatrix::from_nodes(&nodes);
/// assert!((dm.get(1, 2) - 5.0).abs() < 1e-10);
/// assert!((dm.get(1, 7) - 10.0).abs() < 1e-10);
/// assert_eq!(dm.size(), 8);
/// ```
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    data: Vec<f64>,
    size: usize,
}

impl DistanceMatrix {
    /// Creates a distance matrix of the given size, initialized to zero.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0.0; size * size],
            size,
        }
    }

    /// Computes a Euclidean distance matrix from node coordinates.
    pub fn from_nodes(nodes: &[Node]) -> Self {
        let size = nodes.iter().map(Node::id).max().map_or(0, |m| m + 1);
        let mut dm = Self::new(size);
        for (i, a) in nodes.iter().enumerate() {
            for b in &nodes[i + 1..] {
                let d = a.distance_to(b);
                dm.set(a.id(), b.id(), d);
                dm.set(b.id(), a.id(), d);
            }
        }
        dm
    }

    /// Returns the distance from node `from` to node `to`.
    ///
    /// # Panics
    ///
    /// Panics if either id is out of bounds.
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    /// Sets the distance from node `from` to node `to`.
    pub fn set(&mut self, from: usize, to: usize, distance: f64) {
        self.data[from * self.size + to] = distance;
    }

    /// Number of rows (largest node id + 1).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the nearest of `candidates` to `from`.
    ///
    /// Ties keep the first candidate. Returns `None` if `candidates` is empty.
    pub fn nearest_neighbor(&self, from: usize, candidates: &[usize]) -> Option<usize> {
        candidates.iter().copied().fold(None, |best, c| match best {
            Some(b) if self.get(from, b) <= self.get(from, c) => Some(b),
            _ => Some(c),
        })
    }

    /// Total length of a node sequence, summing consecutive legs.
    pub fn path_length(&self, path: &[usize]) -> f64 {
        path.windows(2).map(|w| self.get(w[0], w[1])).sum()
    }
}
