//! In-memory topology provider
//!
//! Nodes sit at fixed 2D positions for the whole run. Two nodes are neighbors
//! when their Euclidean distance is within the communication range, so the
//! adjacency is symmetric by construction.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::wsn_interface::{NodeId, Topology, SINK_ID};

/// Placement stream: seed + 389, apart from the per-round shuffle streams
pub const PLACEMENT_SEED_OFFSET: u64 = 389;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

pub struct StaticTopology {
    positions: Vec<Position>,
    adjacency: Vec<Vec<NodeId>>,
}

impl StaticTopology {
    /// Build adjacency from positions. Neighbor lists come out in ascending id
    /// order, which is what makes tie-breaking in the scoring loops portable.
    pub fn from_positions(positions: Vec<Position>, comm_range: f64) -> Self {
        let adjacency: Vec<Vec<NodeId>> = positions
            .iter()
            .enumerate()
            .map(|(i, p)| {
                positions
                    .iter()
                    .enumerate()
                    .filter(|(j, q)| *j != i && p.distance(q) <= comm_range)
                    .map(|(j, _)| j)
                    .collect()
            })
            .collect();

        Self {
            positions,
            adjacency,
        }
    }

    /// Uniform random placement over a `width` x `height` field with the sink
    /// moved to the centre. Draws from `seed + PLACEMENT_SEED_OFFSET`.
    pub fn random_placement(
        width: f64,
        height: f64,
        nodes: usize,
        comm_range: f64,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(PLACEMENT_SEED_OFFSET));
        let mut positions: Vec<Position> = (0..nodes)
            .map(|_| Position::new(rng.gen_range(0.0..=width), rng.gen_range(0.0..=height)))
            .collect();

        if let Some(sink) = positions.get_mut(SINK_ID) {
            *sink = Position::new(width / 2.0, height / 2.0);
        }

        Self::from_positions(positions, comm_range)
    }

    pub fn position(&self, node: NodeId) -> Position {
        self.positions[node]
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.adjacency[node].len()
    }
}

impl Topology for StaticTopology {
    fn node_count(&self) -> usize {
        self.positions.len()
    }

    fn neighbors(&self, node: NodeId) -> &[NodeId] {
        &self.adjacency[node]
    }

    fn distance(&self, a: NodeId, b: NodeId) -> f64 {
        self.positions[a].distance(&self.positions[b])
    }
}
