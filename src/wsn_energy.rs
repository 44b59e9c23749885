//! Radio energy model
//!
//! Every hop attempt costs the sender `ENERGY_TX` and the receiver `ENERGY_RX`,
//! whether or not the payload survives. Energy only goes down and saturates at
//! zero; a node whose energy reaches zero is dead for the rest of the run.

use crate::wsn_interface::{NodeId, NodeState, ENERGY_RX, ENERGY_TX, SINK_ID};

pub struct EnergyModel {
    tx_cost: f64,
    rx_cost: f64,
    // sink drawing mains power is debited but never dies
    mains_powered_sink: bool,
    total_spent: f64,
}

impl EnergyModel {
    pub fn new(mains_powered_sink: bool) -> Self {
        Self {
            tx_cost: ENERGY_TX,
            rx_cost: ENERGY_RX,
            mains_powered_sink,
            total_spent: 0.0,
        }
    }

    /// Debit one hop from `src` to `dst`. Returns the nodes that died on it.
    pub fn apply(&mut self, states: &mut [NodeState], src: NodeId, dst: NodeId) -> Vec<NodeId> {
        self.total_spent += self.tx_cost + self.rx_cost;

        let mut died = Vec::new();
        for (node, cost) in [(src, self.tx_cost), (dst, self.rx_cost)] {
            if self.debit(&mut states[node], cost) {
                died.push(node);
            }
        }
        died
    }

    fn debit(&self, state: &mut NodeState, cost: f64) -> bool {
        state.energy = (state.energy - cost).max(0.0);

        let exempt = self.mains_powered_sink && state.id == SINK_ID;
        if state.alive && !exempt && state.energy <= 0.0 {
            state.alive = false;
            return true;
        }
        false
    }

    pub fn total_spent(&self) -> f64 {
        self.total_spent
    }
}
