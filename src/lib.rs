//! # evrp-ga
//!
//! Electric vehicle routing with a genetic algorithm. Routes are single node
//! sequences split into trips by depot visits; every individual is kept
//! feasible for cargo capacity and battery range by a two-stage repair.
//!
//! ## Modules
//!
//! - [`models`] — Domain model types (Node, ProblemInstance, Route, Violation)
//! - [`distance`] — Euclidean distance matrix
//! - [`evaluation`] — Route simulation, validation, and fitness strategies
//! - [`repair`] — Structural and resource repair with template fallback
//! - [`local_search`] — 2-opt inside charge segments
//! - [`ga`] — Operators, configuration, and the generational evolver

pub mod distance;
pub mod evaluation;
pub mod ga;
pub mod local_search;
pub mod models;
pub mod repair;
