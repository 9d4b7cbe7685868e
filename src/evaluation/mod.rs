//! Route checking and fitness evaluation.
//!
//! - [`RouteChecker`] — structural checks plus a cargo/battery simulation
//! - [`Evaluation`] — distance, penalized, and rank-based fitness strategies

mod fitness;
mod simulate;

pub use fitness::{route_distance, Evaluation, FitnessMap, DISTANCE_EPSILON};
pub use simulate::{is_feasible, validate_route, RouteChecker, Simulation, ENERGY_TOLERANCE};
