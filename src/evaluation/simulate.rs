//! Route checker that simulates cargo and battery and reports violations.

use crate::models::{ProblemInstance, Route, Violation, ViolationType, DEPOT};

/// Slack allowed on the battery before a leg counts as infeasible.
///
/// Absorbs floating-point error so a leg that drains the battery to exactly
/// zero stays feasible.
pub const ENERGY_TOLERANCE: f64 = 1e-9;

/// Result of walking a route through the resource model.
#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    /// Sum of all leg distances.
    pub total_distance: f64,
    /// Cargo and battery violations, in route order.
    pub violations: Vec<Violation>,
}

impl Simulation {
    /// Returns `true` if no cargo or battery constraint was broken.
    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Checks routes against an instance: structure, cargo, and battery.
///
/// Cargo refills at the depot; the battery refills at the depot and at
/// every station.
///
/// # Examples
///
/// ```
/// use evrp_ga::models::{ProblemInstance, Route};
/// use evrp_ga::evaluation::RouteChecker;
///
/// let instance = ProblemInstance::builder(3)
///     .capacity(10)
///     .energy(100.0, 1.0)
///     .depot(0.0, 0.0)
///     .customer(2, 3.0, 4.0, 4)
///     .customer(3, 6.0, 8.0, 4)
///     .build()
///     .unwrap();
///
/// let checker = RouteChecker::new(&instance);
/// let sim = checker.simulate(&Route::new(vec![1, 2, 3, 1]));
/// assert!(sim.is_feasible());
/// assert!((sim.total_distance - 20.0).abs() < 1e-10);
/// assert!(checker.validate(&Route::new(vec![1, 2, 3, 1]), 1).is_empty());
/// ```
pub struct RouteChecker<'a> {
    instance: &'a ProblemInstance,
}

impl<'a> RouteChecker<'a> {
    /// Creates a checker for the given instance.
    pub fn new(instance: &'a ProblemInstance) -> Self {
        Self { instance }
    }

    /// Walks the route leg by leg, tracking load per trip and remaining charge.
    ///
    /// Node ids must exist in the instance.
    pub fn simulate(&self, route: &Route) -> Simulation {
        let inst = self.instance;
        let nodes = route.nodes();
        let mut violations = Vec::new();
        let mut total_distance = 0.0;
        let mut battery = inst.energy_capacity();
        let mut load: i32 = 0;
        let mut trip_index = 0;

        for i in 1..nodes.len() {
            let (from, to) = (nodes[i - 1], nodes[i]);
            total_distance += inst.distance(from, to);
            battery -= inst.energy(from, to);

            if battery < -ENERGY_TOLERANCE {
                violations.push(Violation::new(ViolationType::BatteryDepleted {
                    position: i,
                    node: to,
                    battery,
                }));
            }

            if to == DEPOT {
                if load > inst.capacity() {
                    violations.push(Violation::new(ViolationType::CapacityExceeded {
                        trip_index,
                        load,
                        capacity: inst.capacity(),
                    }));
                }
                trip_index += 1;
                load = 0;
                battery = inst.energy_capacity();
            } else if inst.is_station(to) {
                battery = inst.energy_capacity();
            } else {
                load += inst.demand(to);
            }
        }

        Simulation {
            total_distance,
            violations,
        }
    }

    /// Structural checks only: depot boundaries, empty trips, node ids,
    /// customer coverage, and the trip minimum.
    pub fn check_structure(&self, route: &Route, min_trips: usize) -> Vec<Violation> {
        let inst = self.instance;
        let nodes = route.nodes();
        let mut violations = Vec::new();

        if nodes.len() < 2 || nodes[0] != DEPOT || nodes[nodes.len() - 1] != DEPOT {
            violations.push(ViolationType::MissingDepotBoundary.into());
        }

        let mut seen = vec![0usize; inst.dimension() + 1];
        for (i, &node) in nodes.iter().enumerate() {
            if node == DEPOT {
                if i > 0 && nodes[i - 1] == DEPOT {
                    violations.push(ViolationType::EmptyTrip { position: i }.into());
                }
            } else if inst.is_customer(node) {
                seen[node] += 1;
                if seen[node] == 2 {
                    violations.push(ViolationType::DuplicateCustomer { customer: node }.into());
                }
            } else if !inst.is_station(node) {
                violations.push(ViolationType::UnknownNode { node }.into());
            }
        }

        for customer in inst.customers() {
            if seen[customer] == 0 {
                violations.push(ViolationType::MissingCustomer { customer }.into());
            }
        }

        let trips = route.num_trips();
        if trips < min_trips {
            violations.push(
                ViolationType::TooFewTrips {
                    trips,
                    required: min_trips,
                }
                .into(),
            );
        }

        violations
    }

    /// Structural checks followed by the resource simulation.
    ///
    /// The simulation is skipped when the route contains unknown node ids.
    /// An empty result means the route is feasible.
    pub fn validate(&self, route: &Route, min_trips: usize) -> Vec<Violation> {
        let mut violations = self.check_structure(route, min_trips);
        let has_unknown = violations
            .iter()
            .any(|v| matches!(v.kind, ViolationType::UnknownNode { .. }));
        if !has_unknown {
            violations.extend(self.simulate(route).violations);
        }
        violations
    }
}

/// Checks every structural and resource constraint of a route.
///
/// Returns all violations found; an empty vector means the route is feasible.
pub fn validate_route(route: &Route, instance: &ProblemInstance, min_trips: usize) -> Vec<Violation> {
    RouteChecker::new(instance).validate(route, min_trips)
}

/// Returns `true` if the route satisfies every constraint.
pub fn is_feasible(route: &Route, instance: &ProblemInstance, min_trips: usize) -> bool {
    validate_route(route, instance, min_trips).is_empty()
}
