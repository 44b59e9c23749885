//! Relay chain for the chain-relay policy
//!
//! A single nearest-neighbor chain over all sensors, built once before the
//! first round. Construction starts at the lowest sensor id and repeatedly
//! moves to the closest unvisited sensor; the last sensor hands off to the
//! sink. Energy, trust and liveness play no part.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::wsn_interface::{NodeId, Topology, SINK_ID};

pub struct RelayChain {
    // predecessor -> successor, in chain order
    next: IndexMap<NodeId, NodeId>,
}

impl RelayChain {
    pub fn build<T: Topology>(topology: &T) -> Self {
        let mut next = IndexMap::new();
        let mut unvisited: BTreeSet<NodeId> = (0..topology.node_count())
            .filter(|id| *id != SINK_ID)
            .collect();

        let mut current = match unvisited.first() {
            Some(first) => *first,
            None => return Self { next },
        };

        while unvisited.remove(&current) {
            let mut best: Option<(NodeId, f64)> = None;
            for &candidate in &unvisited {
                let d = topology.distance(current, candidate);
                if best.map_or(true, |(_, best_d)| d < best_d) {
                    best = Some((candidate, d));
                }
            }

            match best {
                Some((successor, _)) => {
                    next.insert(current, successor);
                    current = successor;
                }
                None => {
                    next.insert(current, SINK_ID);
                }
            }
        }

        Self { next }
    }

    pub fn successor(&self, node: NodeId) -> Option<NodeId> {
        self.next.get(&node).copied()
    }

    /// Chain links in construction order
    pub fn links(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.next.iter().map(|(a, b)| (*a, *b))
    }

    pub fn len(&self) -> usize {
        self.next.len()
    }

    pub fn is_empty(&self) -> bool {
        self.next.is_empty()
    }
}
