//! Domain model types for electric vehicle routing.
//!
//! Provides the core abstractions: nodes (depot, customers, stations), the
//! immutable problem instance, the route chromosome, and the violation types
//! reported when a route breaks a constraint.

mod instance;
mod node;
mod route;
mod violation;

pub use instance::{InstanceBuilder, InstanceError, ProblemInstance};
pub use node::{Node, NodeKind, DEPOT};
pub use route::Route;
pub use violation::{Violation, ViolationType};
