//! Q-learning over (node, next hop) pairs
//!
//! The table starts empty and only ever grows. Reads of a missing pair yield
//! 0.0. After each successful hop taken by the learned policy the pair is
//! moved toward `reward + gamma * best value out of the next node`, so routes
//! through energy-rich, trusted, sink-proximate relays build up value.

use hashbrown::HashMap;

use crate::wsn_interface::{NodeId, NodeState, Topology, SINK_ID};

pub const LEARNING_RATE: f64 = 0.2;
pub const DISCOUNT: f64 = 0.85;

// reward = 1.0 + 0.5 * energy + 0.8 * trust (+ 2.0 when the sink was reached)
const REWARD_BASE: f64 = 1.0;
const REWARD_ENERGY_WEIGHT: f64 = 0.5;
const REWARD_TRUST_WEIGHT: f64 = 0.8;
const REWARD_SINK_BONUS: f64 = 2.0;

#[derive(Clone, Debug)]
pub struct QTable {
    values: HashMap<(NodeId, NodeId), f64>,
    alpha: f64,
    gamma: f64,
}

impl Default for QTable {
    fn default() -> Self {
        Self::new()
    }
}

impl QTable {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
            alpha: LEARNING_RATE,
            gamma: DISCOUNT,
        }
    }

    pub fn value(&self, state: NodeId, action: NodeId) -> f64 {
        self.values.get(&(state, action)).copied().unwrap_or(0.0)
    }

    /// One-step update of `(state, action)` after landing on `next_state`.
    ///
    /// The bootstrap term takes the best known value out of `next_state`,
    /// floored at zero, so a node with no learned exits contributes nothing.
    pub fn update<T: Topology>(
        &mut self,
        state: NodeId,
        action: NodeId,
        next_state: NodeId,
        topology: &T,
        reward: f64,
    ) {
        let max_next = topology
            .neighbors(next_state)
            .iter()
            .filter_map(|n| self.values.get(&(next_state, *n)))
            .fold(0.0_f64, |acc, v| acc.max(*v));

        let old = self.value(state, action);
        let updated = old + self.alpha * (reward + self.gamma * max_next - old);
        self.values.insert((state, action), updated);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All entries ordered by (state, action)
    pub fn entries_sorted(&self) -> Vec<((NodeId, NodeId), f64)> {
        let mut entries: Vec<_> = self.values.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(k, _)| *k);
        entries
    }
}

/// Reward for a successful hop onto `next`, read after its energy and trust
/// have been updated for this hop.
pub fn hop_reward(next: &NodeState) -> f64 {
    let mut reward =
        REWARD_BASE + REWARD_ENERGY_WEIGHT * next.energy + REWARD_TRUST_WEIGHT * next.trust;
    if next.id == SINK_ID {
        reward += REWARD_SINK_BONUS;
    }
    reward
}
