//! Feasibility repair for EVRP routes.
//!
//! - [`repair_structure`] — Depot boundaries, customer coverage, trip layout
//! - [`repair_resources`] — Station and depot insertion for battery and cargo
//! - [`FeasibilityRepairer`] — Both stages plus template fallback

mod repairer;
mod resource;
mod structural;

pub use repairer::{repair, FeasibilityRepairer};
pub use resource::{repair_resources, RepairError};
pub use structural::{repair_structure, RepairOptions, SPILL_TRIP_LEN};
