//! Local search for repaired routes.
//!
//! - [`two_opt_improve`] — 2-opt on a path with fixed endpoints
//! - [`improve_charge_segments`] — 2-opt on every run of customers between
//!   depot and station visits

mod two_opt;

pub use two_opt::{improve_charge_segments, two_opt_improve};
