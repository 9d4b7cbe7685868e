//! Genetic algorithm for electric vehicle routing.
//!
//! - [`random_route`] — Random initial routes
//! - [`Selection`] — Roulette, tournament, and rank selection
//! - [`Crossover`] — One-point, two-point, uniform, and order crossover
//! - [`Mutation`] — Swap, inversion, scramble, insertion, nearest-neighbour, and 2-opt
//! - [`Replacement`] — Full, elitist, and steady-state replacement
//! - [`Evolver`] — Generational loop with stagnation and budget stopping

mod config;
mod crossover;
mod evolver;
mod init;
mod mutation;
mod replacement;
mod selection;

pub use config::{ConfigError, EvolverConfig};
pub use crossover::Crossover;
pub use evolver::{EvolutionResult, Evolver, ImprovementEvent, Phase, StopReason};
pub use init::{random_route, singleton_route};
pub use mutation::Mutation;
pub use replacement::Replacement;
pub use selection::Selection;
