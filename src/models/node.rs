//! Node types: depot, customers, and recharging stations.

use serde::{Deserialize, Serialize};

/// Identifier of the depot. Every trip starts and ends here.
pub const DEPOT: usize = 1;

/// Role of a node in an EVRP instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// The single depot (id 1). Refills cargo and battery.
    Depot,
    /// A customer with a demand to deliver.
    Customer,
    /// A recharging station. Refills the battery, leaves cargo untouched.
    Station,
}

/// A location in an EVRP instance.
///
/// Node ids start at 1. The depot is always id [`DEPOT`], customers are
/// `2..=DIMENSION`, and stations use a disjoint id range.
///
/// # Examples
///
/// ```
/// use evrp_ga::models::{Node, NodeKind, DEPOT};
///
/// let depot = Node::depot(35.0, 35.0);
/// assert_eq!(depot.id(), DEPOT);
/// assert_eq!(depot.demand(), 0);
///
/// let c = Node::customer(2, 41.0, 49.0, 10);
/// assert_eq!(c.kind(), NodeKind::Customer);
/// assert_eq!(c.demand(), 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: usize,
    x: f64,
    y: f64,
    demand: i32,
    kind: NodeKind,
}

impl Node {
    /// Creates the depot at the given coordinates (id 1, demand 0).
    pub fn depot(x: f64, y: f64) -> Self {
        Self {
            id: DEPOT,
            x,
            y,
            demand: 0,
            kind: NodeKind::Depot,
        }
    }

    /// Creates a customer with a delivery demand.
    pub fn customer(id: usize, x: f64, y: f64, demand: i32) -> Self {
        Self {
            id,
            x,
            y,
            demand,
            kind: NodeKind::Customer,
        }
    }

    /// Creates a recharging station (demand 0).
    pub fn station(id: usize, x: f64, y: f64) -> Self {
        Self {
            id,
            x,
            y,
            demand: 0,
            kind: NodeKind::Station,
        }
    }

    /// Node id.
    pub fn id(&self) -> usize {
        self.id
    }

    /// X-coordinate.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Y-coordinate.
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Cargo units delivered at this node. Zero for depot and stations.
    pub fn demand(&self) -> i32 {
        self.demand
    }

    /// Role of this node.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns `true` if a visit here refills the battery.
    pub fn recharges(&self) -> bool {
        matches!(self.kind, NodeKind::Depot | NodeKind::Station)
    }

    /// Euclidean distance to another node.
    pub fn distance_to(&self, other: &Node) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}
