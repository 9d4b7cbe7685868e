//! Constraint violation types.

/// A way a route can break the EVRP contract.
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationType {
    /// Route does not start and end at the depot.
    MissingDepotBoundary,
    /// Two consecutive depot visits (a trip with no stops).
    EmptyTrip {
        /// Index of the second depot marker.
        position: usize,
    },
    /// Node id that is neither depot, customer, nor (allowed) station.
    UnknownNode {
        /// Offending id.
        node: usize,
    },
    /// Customer served more than once.
    DuplicateCustomer {
        /// Customer id.
        customer: usize,
    },
    /// Customer never served.
    MissingCustomer {
        /// Customer id.
        customer: usize,
    },
    /// Fewer trips than the fleet minimum.
    TooFewTrips {
        /// Trips in the route.
        trips: usize,
        /// Required minimum.
        required: usize,
    },
    /// A trip delivers more than the vehicle carries.
    CapacityExceeded {
        /// Trip index in the route.
        trip_index: usize,
        /// Total demand of the trip.
        load: i32,
        /// Vehicle capacity.
        capacity: i32,
    },
    /// Battery goes negative on arrival at a node.
    BatteryDepleted {
        /// Index of the node reached with a negative charge.
        position: usize,
        /// Node id at that position.
        node: usize,
        /// Remaining charge on arrival.
        battery: f64,
    },
}

impl ViolationType {
    /// Returns `true` for structural problems (as opposed to cargo/battery).
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            ViolationType::CapacityExceeded { .. } | ViolationType::BatteryDepleted { .. }
        )
    }
}

/// A constraint violation in a route.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// The type of violation.
    pub kind: ViolationType,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationType) -> Self {
        Self { kind }
    }
}

impl From<ViolationType> for Violation {
    fn from(kind: ViolationType) -> Self {
        Self::new(kind)
    }
}
