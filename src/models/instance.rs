//! Immutable EVRP problem instance.

use crate::distance::{DistanceMatrix, PriorityMatrix};

use super::{Node, NodeKind, DEPOT};

/// Errors raised while assembling a [`ProblemInstance`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InstanceError {
    #[error("Dimension must be at least 2 (depot plus one customer), got {0}")]
    InvalidDimension(usize),
    #[error("Vehicle count must be at least 1")]
    InvalidVehicles,
    #[error("Cargo capacity must be positive, got {0}")]
    InvalidCapacity(i32),
    #[error("Energy capacity must be positive and finite, got {0}")]
    InvalidEnergyCapacity(f64),
    #[error("Energy consumption must be non-negative and finite, got {0}")]
    InvalidEnergyConsumption(f64),
    #[error("Depot (node 1) has no coordinates")]
    MissingDepot,
    #[error("Customer {0} has no coordinates")]
    MissingCustomer(usize),
    #[error("Node {id} cannot be a {kind:?} for dimension {dimension}")]
    InvalidNodeId {
        id: usize,
        kind: NodeKind,
        dimension: usize,
    },
    #[error("Node {0} is defined more than once")]
    DuplicateNode(usize),
    #[error("Node {0} has non-finite coordinates")]
    NonFiniteCoordinate(usize),
    #[error("Customer {customer} has negative demand {demand}")]
    NegativeDemand { customer: usize, demand: i32 },
    #[error("Customer {customer} demands {demand}, more than vehicle capacity {capacity}")]
    DemandExceedsCapacity {
        customer: usize,
        demand: i32,
        capacity: i32,
    },
}

/// An electric vehicle routing instance.
///
/// Holds the depot, customers (ids `2..=dimension`), recharging stations,
/// fleet limits, and a precomputed distance matrix. Immutable once built;
/// every other component only reads it.
///
/// # Examples
///
/// ```
/// use evrp_ga::models::ProblemInstance;
///
/// let instance = ProblemInstance::builder(3)
///     .vehicles(1)
///     .capacity(10)
///     .energy(100.0, 1.0)
///     .depot(0.0, 0.0)
///     .customer(2, 3.0, 4.0, 4)
///     .customer(3, 6.0, 8.0, 4)
///     .station(4, 5.0, 5.0)
///     .build()
///     .unwrap();
///
/// assert_eq!(instance.num_customers(), 2);
/// assert!(instance.is_station(4));
/// assert!((instance.distance(1, 2) - 5.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct ProblemInstance {
    dimension: usize,
    vehicles: usize,
    capacity: i32,
    energy_capacity: f64,
    energy_consumption: f64,
    nodes: Vec<Option<Node>>,
    stations: Vec<usize>,
    distances: DistanceMatrix,
    priorities: PriorityMatrix,
}

impl ProblemInstance {
    /// Starts building an instance with `dimension` = depot + customers.
    pub fn builder(dimension: usize) -> InstanceBuilder {
        InstanceBuilder::new(dimension)
    }

    /// Depot plus customer count (customers are `2..=dimension`).
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Minimum number of vehicle trips a solution must use.
    pub fn vehicles(&self) -> usize {
        self.vehicles
    }

    /// Maximum cargo per trip.
    pub fn capacity(&self) -> i32 {
        self.capacity
    }

    /// Battery size.
    pub fn energy_capacity(&self) -> f64 {
        self.energy_capacity
    }

    /// Battery drain per unit of distance.
    pub fn energy_consumption(&self) -> f64 {
        self.energy_consumption
    }

    /// Depot id (always 1).
    pub fn depot(&self) -> usize {
        DEPOT
    }

    /// Station ids in ascending order.
    pub fn stations(&self) -> &[usize] {
        &self.stations
    }

    /// Number of customers (excluding the depot).
    pub fn num_customers(&self) -> usize {
        self.dimension - 1
    }

    /// Customer ids, `2..=dimension`.
    pub fn customers(&self) -> impl Iterator<Item = usize> {
        2..=self.dimension
    }

    /// Looks up a node by id.
    pub fn node(&self, id: usize) -> Option<&Node> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    /// Coordinates of a node, if it exists.
    pub fn coordinates(&self, id: usize) -> Option<(f64, f64)> {
        self.node(id).map(|n| (n.x(), n.y()))
    }

    /// Demand of a node. Zero for the depot, stations, and unknown ids.
    pub fn demand(&self, id: usize) -> i32 {
        self.node(id).map_or(0, Node::demand)
    }

    /// Returns `true` for customer ids.
    pub fn is_customer(&self, id: usize) -> bool {
        (2..=self.dimension).contains(&id)
    }

    /// Returns `true` for station ids.
    pub fn is_station(&self, id: usize) -> bool {
        self.node(id)
            .is_some_and(|n| n.kind() == NodeKind::Station)
    }

    /// Returns `true` if visiting `id` refills the battery (depot or station).
    pub fn recharges_at(&self, id: usize) -> bool {
        id == DEPOT || self.is_station(id)
    }

    /// Euclidean distance between two nodes.
    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.distances.get(from, to)
    }

    /// Battery drained travelling from `from` to `to`.
    pub fn energy(&self, from: usize, to: usize) -> f64 {
        self.energy_consumption * self.distances.get(from, to)
    }

    /// The underlying distance matrix.
    pub fn distances(&self) -> &DistanceMatrix {
        &self.distances
    }

    /// Customers ranked by proximity to each node.
    pub fn priorities(&self) -> &PriorityMatrix {
        &self.priorities
    }

    /// Nearest station to `from` among those accepted by `accept`.
    ///
    /// Ties keep the lower id.
    pub fn nearest_station(&self, from: usize, accept: impl Fn(usize) -> bool) -> Option<usize> {
        let candidates: Vec<usize> = self
            .stations
            .iter()
            .copied()
            .filter(|&s| accept(s))
            .collect();
        self.distances.nearest_neighbor(from, &candidates)
    }
}

/// Step-by-step construction of a [`ProblemInstance`].
///
/// Validation happens in [`build`](InstanceBuilder::build).
#[derive(Debug, Clone)]
pub struct InstanceBuilder {
    dimension: usize,
    vehicles: usize,
    capacity: i32,
    energy_capacity: f64,
    energy_consumption: f64,
    nodes: Vec<Node>,
}

impl InstanceBuilder {
    /// Creates a builder. Defaults: 1 vehicle, capacity 0 and no battery,
    /// both of which must be set before `build`.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vehicles: 1,
            capacity: 0,
            energy_capacity: 0.0,
            energy_consumption: 1.0,
            nodes: Vec::new(),
        }
    }

    /// Sets the minimum number of trips (VEHICLES).
    pub fn vehicles(mut self, vehicles: usize) -> Self {
        self.vehicles = vehicles;
        self
    }

    /// Sets the cargo capacity per trip.
    pub fn capacity(mut self, capacity: i32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets battery size and per-distance consumption.
    pub fn energy(mut self, capacity: f64, consumption: f64) -> Self {
        self.energy_capacity = capacity;
        self.energy_consumption = consumption;
        self
    }

    /// Places the depot.
    pub fn depot(self, x: f64, y: f64) -> Self {
        self.node(Node::depot(x, y))
    }

    /// Adds a customer.
    pub fn customer(self, id: usize, x: f64, y: f64, demand: i32) -> Self {
        self.node(Node::customer(id, x, y, demand))
    }

    /// Adds a recharging station.
    pub fn station(self, id: usize, x: f64, y: f64) -> Self {
        self.node(Node::station(id, x, y))
    }

    /// Adds an already constructed node.
    pub fn node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Validates the collected data and builds the instance.
    pub fn build(self) -> Result<ProblemInstance, InstanceError> {
        let dimension = self.dimension;
        if dimension < 2 {
            return Err(InstanceError::InvalidDimension(dimension));
        }
        if self.vehicles == 0 {
            return Err(InstanceError::InvalidVehicles);
        }
        if self.capacity <= 0 {
            return Err(InstanceError::InvalidCapacity(self.capacity));
        }
        if !self.energy_capacity.is_finite() || self.energy_capacity <= 0.0 {
            return Err(InstanceError::InvalidEnergyCapacity(self.energy_capacity));
        }
        if !self.energy_consumption.is_finite() || self.energy_consumption < 0.0 {
            return Err(InstanceError::InvalidEnergyConsumption(
                self.energy_consumption,
            ));
        }

        let size = self
            .nodes
            .iter()
            .map(Node::id)
            .max()
            .unwrap_or(0)
            .max(dimension)
            + 1;
        let mut slots: Vec<Option<Node>> = vec![None; size];

        for node in &self.nodes {
            let id = node.id();
            let id_ok = match node.kind() {
                NodeKind::Depot => id == DEPOT,
                NodeKind::Customer => (2..=dimension).contains(&id),
                NodeKind::Station => id > dimension,
            };
            if !id_ok {
                return Err(InstanceError::InvalidNodeId {
                    id,
                    kind: node.kind(),
                    dimension,
                });
            }
            if !node.x().is_finite() || !node.y().is_finite() {
                return Err(InstanceError::NonFiniteCoordinate(id));
            }
            if node.demand() < 0 {
                return Err(InstanceError::NegativeDemand {
                    customer: id,
                    demand: node.demand(),
                });
            }
            if node.demand() > self.capacity {
                return Err(InstanceError::DemandExceedsCapacity {
                    customer: id,
                    demand: node.demand(),
                    capacity: self.capacity,
                });
            }
            if slots[id].is_some() {
                return Err(InstanceError::DuplicateNode(id));
            }
            slots[id] = Some(node.clone());
        }

        if slots[DEPOT].is_none() {
            return Err(InstanceError::MissingDepot);
        }
        if let Some(missing) = (2..=dimension).find(|&c| slots[c].is_none()) {
            return Err(InstanceError::MissingCustomer(missing));
        }

        let stations: Vec<usize> = slots
            .iter()
            .flatten()
            .filter(|n| n.kind() == NodeKind::Station)
            .map(Node::id)
            .collect();
        let distances = DistanceMatrix::from_nodes(&self.nodes);
        let origins: Vec<usize> = slots.iter().flatten().map(Node::id).collect();
        let customers: Vec<usize> = (2..=dimension).collect();
        let priorities = PriorityMatrix::new(&distances, &origins, &customers);

        Ok(ProblemInstance {
            dimension,
            vehicles: self.vehicles,
            capacity: self.capacity,
            energy_capacity: self.energy_capacity,
            energy_consumption: self.energy_consumption,
            nodes: slots,
            stations,
            distances,
            priorities,
        })
    }
}
