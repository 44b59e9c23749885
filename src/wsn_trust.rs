// trust bookkeeping from observed forward/drop behavior

use crate::wsn_attacks::AttackRoles;
use crate::wsn_interface::{NodeId, NodeState};

pub const TRUST_REWARD: f64 = 0.02;
pub const TRUST_PENALTY: f64 = 0.08;
pub const SYBIL_PENALTY: f64 = 0.02;

/// Signed trust change for one observation of `node`.
pub fn trust_delta(roles: &AttackRoles, node: NodeId, forwarded: bool) -> f64 {
    let delta = if forwarded { TRUST_REWARD } else { -TRUST_PENALTY };
    if roles.is_sybil(node) {
        delta - SYBIL_PENALTY
    } else {
        delta
    }
}

/// Apply one observation to `node`, keeping trust inside `[0, 1]`.
///
/// This is the only place trust changes; there is no decay over time.
pub fn update_trust(states: &mut [NodeState], roles: &AttackRoles, node: NodeId, forwarded: bool) {
    let state = &mut states[node];
    state.trust = (state.trust + trust_delta(roles, node, forwarded)).clamp(0.0, 1.0);
}
