//! Distance matrix over node ids.
//!
//! Provides a dense Euclidean distance matrix for EVRP instances and the
//! nearest-neighbour priorities derived from it.

mod matrix;
mod priority;

pub use matrix::DistanceMatrix;
pub use priority::PriorityMatrix;
