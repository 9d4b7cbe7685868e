//! 2-opt within charge segments.
//!
//! # Algorithm
//!
//! A charge segment is the run of customers between two consecutive
//! non-customer nodes (depot or station) of a route. Its endpoints stay put;
//! for every pair of positions `i <= j` inside it the gain of reversing
//! `path[i..=j]` is
//!
//! ```text
//! delta = d(before_i, path[j]) + d(path[i], after_j)
//!       - d(before_i, path[i]) - d(path[j], after_j)
//! ```
//!
//! where `before_i`/`after_j` fall back to the segment endpoints. Any
//! reversal with delta < 0 is applied at once (first improvement) and the
//! scan repeats until a full pass finds none.
//!
//! Shortening a segment never raises its energy use or moves cargo between
//! trips, so a feasible route stays feasible.
//!
//! # Complexity
//!
//! O(n²) per pass for a segment of n customers.

use crate::distance::DistanceMatrix;
use crate::models::{ProblemInstance, Route};

/// Smallest gain accepted as an improvement.
const IMPROVEMENT_EPSILON: f64 = 1e-10;

/// Reorders `path` (customers only) to shorten `start → path → end`.
///
/// Returns the improved order and its length including both endpoint legs.
///
/// # Examples
///
/// ```
/// use evrp_ga::models::Node;
/// use evrp_ga::distance::DistanceMatrix;
/// use evrp_ga::local_search::two_opt_improve;
///
/// let nodes = vec![
///     Node::depot(0.0, 0.0),
///     Node::customer(2, 1.0, 0.0, 1),
///     Node::customer(3, 2.0, 0.0, 1),
///     Node::station(4, 3.0, 0.0),
/// ];
/// let dm = DistanceMatrix::from_nodes(&nodes);
///
/// let (path, dist) = two_opt_improve(&[3, 2], 1, 4, &dm);
/// assert_eq!(path, vec![2, 3]);
/// assert!((dist - 3.0).abs() < 1e-10);
/// ```
pub fn two_opt_improve(
    path: &[usize],
    start: usize,
    end: usize,
    distances: &DistanceMatrix,
) -> (Vec<usize>, f64) {
    let mut current = path.to_vec();
    let n = current.len();
    let mut improved = n >= 2;

    while improved {
        improved = false;
        for i in 0..n - 1 {
            for j in i + 1..n {
                if reversal_delta(&current, start, end, distances, i, j) < -IMPROVEMENT_EPSILON {
                    current[i..=j].reverse();
                    improved = true;
                }
            }
        }
    }

    let dist = segment_length(&current, start, end, distances);
    (current, dist)
}

/// Applies [`two_opt_improve`] to every charge segment of `route`.
///
/// Depots and stations keep their positions; customers before the first
/// or after the last of them are left alone.
pub fn improve_charge_segments(route: &Route, instance: &ProblemInstance) -> Route {
    let mut nodes = route.nodes().to_vec();
    let bounds: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|&(_, &n)| !instance.is_customer(n))
        .map(|(i, _)| i)
        .collect();

    for pair in bounds.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if hi - lo < 3 {
            continue;
        }
        let (path, _) = two_opt_improve(&nodes[lo + 1..hi], nodes[lo], nodes[hi], instance.distances());
        nodes[lo + 1..hi].copy_from_slice(&path);
    }
    Route::new(nodes)
}

fn reversal_delta(
    path: &[usize],
    start: usize,
    end: usize,
    distances: &DistanceMatrix,
    i: usize,
    j: usize,
) -> f64 {
    let before = if i == 0 { start } else { path[i - 1] };
    let after = if j + 1 == path.len() { end } else { path[j + 1] };

    let old_cost = distances.get(before, path[i]) + distances.get(path[j], after);
    let new_cost = distances.get(before, path[j]) + distances.get(path[i], after);
    new_cost - old_cost
}

fn segment_length(path: &[usize], start: usize, end: usize, distances: &DistanceMatrix) -> f64 {
    let Some((&first, &last)) = path.first().zip(path.last()) else {
        return distances.get(start, end);
    };
    distances.get(start, first) + distances.path_length(path) + distances.get(last, end)
}
