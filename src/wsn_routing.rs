//! Forwarding policies
//!
//! Four next-hop strategies, one chosen per run:
//!
//! - **aodv_like**: greedy geographic progress toward the sink
//! - **leach_like**: energy-weighted progress
//! - **pegasis_like**: follow a precomputed nearest-neighbor relay chain
//! - **secure_ml**: trust/energy gated heuristic utility blended with learned
//!   Q-values
//!
//! Live-scoring policies walk the neighbor list in ascending id order and keep
//! the first candidate with a strictly greater score, so ties go to the lowest
//! id. Sinkhole neighbors get their score inflated before comparison.

use std::fmt;
use std::str::FromStr;

use crate::wsn_attacks::AttackRoles;
use crate::wsn_chain::RelayChain;
use crate::wsn_config::ConfigError;
use crate::wsn_interface::{NodeId, NodeState, Topology, SINK_ID};
use crate::wsn_qlearning::{hop_reward, QTable};

// leach_like weights
const LEACH_ENERGY_WEIGHT: f64 = 0.6;
const LEACH_PROGRESS_WEIGHT: f64 = 0.4;

// secure_ml candidate gate
pub const LEARNED_MIN_ENERGY: f64 = 0.15;
pub const LEARNED_MIN_TRUST: f64 = 0.3;

// secure_ml utility features
const U_ENERGY: f64 = 0.35;
const U_PROGRESS: f64 = 0.25;
const U_DEGREE: f64 = 0.10;
const U_LINK: f64 = 0.10;
const U_TRUST: f64 = 0.20;

// secure_ml score blend
const S_UTILITY: f64 = 0.6;
const S_Q: f64 = 0.4;
const S_RISK: f64 = 0.6;
const S_ENERGY: f64 = 0.3;

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    AodvLike,
    LeachLike,
    PegasisLike,
    SecureMl,
}

impl Protocol {
    pub const ALL: [Protocol; 4] = [
        Protocol::AodvLike,
        Protocol::LeachLike,
        Protocol::PegasisLike,
        Protocol::SecureMl,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Protocol::AodvLike => "aodv_like",
            Protocol::LeachLike => "leach_like",
            Protocol::PegasisLike => "pegasis_like",
            Protocol::SecureMl => "secure_ml",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Protocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aodv_like" | "aodv" => Ok(Protocol::AodvLike),
            "leach_like" | "leach" => Ok(Protocol::LeachLike),
            "pegasis_like" | "pegasis" => Ok(Protocol::PegasisLike),
            "secure_ml" => Ok(Protocol::SecureMl),
            other => Err(ConfigError::UnknownProtocol(other.to_string())),
        }
    }
}

/// What a policy gets to look at when picking a hop
pub struct RouteView<'a, T: Topology> {
    pub topology: &'a T,
    pub states: &'a [NodeState],
    pub roles: &'a AttackRoles,
    /// A mains-powered sink is never gated out on residual energy
    pub mains_powered_sink: bool,
}

pub enum ForwardingPolicy {
    GreedyProgress,
    EnergyWeighted,
    ChainRelay(RelayChain),
    Learned(QTable),
}

impl ForwardingPolicy {
    /// Build the policy for `protocol`. The relay chain is computed here, once,
    /// before any round runs.
    pub fn for_protocol<T: Topology>(protocol: Protocol, topology: &T) -> Self {
        match protocol {
            Protocol::AodvLike => ForwardingPolicy::GreedyProgress,
            Protocol::LeachLike => ForwardingPolicy::EnergyWeighted,
            Protocol::PegasisLike => ForwardingPolicy::ChainRelay(RelayChain::build(topology)),
            Protocol::SecureMl => ForwardingPolicy::Learned(QTable::new()),
        }
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            ForwardingPolicy::GreedyProgress => Protocol::AodvLike,
            ForwardingPolicy::EnergyWeighted => Protocol::LeachLike,
            ForwardingPolicy::ChainRelay(_) => Protocol::PegasisLike,
            ForwardingPolicy::Learned(_) => Protocol::SecureMl,
        }
    }

    /// Route discovery traffic is only charged to the on-demand policies
    pub fn counts_control_packets(&self) -> bool {
        matches!(
            self,
            ForwardingPolicy::GreedyProgress | ForwardingPolicy::EnergyWeighted
        )
    }

    pub fn next_hop<T: Topology>(&self, view: &RouteView<'_, T>, current: NodeId) -> Option<NodeId> {
        match self {
            ForwardingPolicy::GreedyProgress => best_of(view, current, |_, progress| progress),
            ForwardingPolicy::EnergyWeighted => best_of(view, current, |state, progress| {
                LEACH_ENERGY_WEIGHT * state.energy + LEACH_PROGRESS_WEIGHT * progress
            }),
            ForwardingPolicy::ChainRelay(chain) => chain.successor(current),
            ForwardingPolicy::Learned(q) => learned_next_hop(view, q, current),
        }
    }

    /// Feedback after a successful hop. Only the learned policy uses it.
    pub fn observe_hop<T: Topology>(
        &mut self,
        topology: &T,
        states: &[NodeState],
        from: NodeId,
        to: NodeId,
    ) {
        if let ForwardingPolicy::Learned(q) = self {
            q.update(from, to, to, topology, hop_reward(&states[to]));
        }
    }

    pub fn q_table(&self) -> Option<&QTable> {
        match self {
            ForwardingPolicy::Learned(q) => Some(q),
            _ => None,
        }
    }

    pub fn chain(&self) -> Option<&RelayChain> {
        match self {
            ForwardingPolicy::ChainRelay(chain) => Some(chain),
            _ => None,
        }
    }
}

/// First strictly-best alive neighbor under `score(state, progress)`, with the
/// sinkhole multiplier applied.
fn best_of<T, F>(view: &RouteView<'_, T>, current: NodeId, score: F) -> Option<NodeId>
where
    T: Topology,
    F: Fn(&NodeState, f64) -> f64,
{
    let candidates = view
        .topology
        .neighbors(current)
        .iter()
        .copied()
        .filter(|n| view.states[*n].alive)
        .map(|n| {
            let progress = view.topology.progress(current, n);
            let s = score(&view.states[n], progress) * view.roles.advertised_multiplier(n);
            (n, s)
        });

    first_max(candidates)
}

fn learned_next_hop<T: Topology>(view: &RouteView<'_, T>, q: &QTable, current: NodeId) -> Option<NodeId> {
    let candidates = view
        .topology
        .neighbors(current)
        .iter()
        .copied()
        .filter(|n| {
            let s = &view.states[*n];
            let powered = *n == SINK_ID && view.mains_powered_sink;
            s.alive && (powered || s.energy > LEARNED_MIN_ENERGY) && s.trust >= LEARNED_MIN_TRUST
        })
        .map(|n| (n, learned_score(view, q, current, n)));

    first_max(candidates)
}

/// Blend of heuristic utility, learned value, risk and residual energy
pub fn learned_score<T: Topology>(view: &RouteView<'_, T>, q: &QTable, current: NodeId, n: NodeId) -> f64 {
    let state = &view.states[n];
    let degree = view.topology.neighbors(n).len() as f64;
    let progress = view.topology.progress(current, n);
    let link_quality = 1.0 / (1.0 + view.topology.distance(current, n));

    let utility = U_ENERGY * state.energy
        + U_PROGRESS * progress
        + U_DEGREE * degree
        + U_LINK * link_quality
        + U_TRUST * state.trust;
    let risk = 1.0 - state.trust;

    S_UTILITY * utility + S_Q * q.value(current, n) - S_RISK * risk + S_ENERGY * state.energy
}

fn first_max<I: Iterator<Item = (NodeId, f64)>>(candidates: I) -> Option<NodeId> {
    let mut best: Option<(NodeId, f64)> = None;
    for (n, s) in candidates {
        if best.map_or(true, |(_, best_s)| s > best_s) {
            best = Some((n, s));
        }
    }
    best.map(|(n, _)| n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wsn_attacks::AttackRole;
    use crate::wsn_topology::{Position, StaticTopology};

    // sink at origin, relays 1 and 2 at equal distance, source 3 behind them
    fn diamond() -> StaticTopology {
        StaticTopology::from_positions(
            vec![
                Position::new(0.0, 0.0),
                Position::new(1.0, 1.0),
                Position::new(1.0, -1.0),
                Position::new(2.0, 0.0),
            ],
            1.5,
        )
    }

    fn route_view<'a>(
        topo: &'a StaticTopology,
        states: &'a [NodeState],
        roles: &'a AttackRoles,
    ) -> RouteView<'a, StaticTopology> {
        RouteView {
            topology: topo,
            states,
            roles,
            mains_powered_sink: true,
        }
    }

    fn states(n: usize, energy: f64) -> Vec<NodeState> {
        (0..n).map(|i| NodeState::new(i, energy)).collect()
    }

    #[test]
    fn test_protocol_names_round_trip() {
        for p in Protocol::ALL {
            assert_eq!(p.name().parse::<Protocol>().unwrap(), p);
        }
        assert_eq!("aodv".parse::<Protocol>().unwrap(), Protocol::AodvLike);
        assert!("ospf".parse::<Protocol>().is_err());
    }

    #[test]
    fn test_greedy_tie_goes_to_lowest_id() {
        let topo = diamond();
        let s = states(4, 1.0);
        let roles = AttackRoles::empty();
        let view = route_view(&topo, &s, &roles);

        let policy = ForwardingPolicy::for_protocol(Protocol::AodvLike, &topo);
        assert_eq!(policy.next_hop(&view, 3), Some(1));
        assert_eq!(policy.next_hop(&view, 1), Some(SINK_ID));
    }

    #[test]
    fn test_greedy_skips_dead_neighbors() {
        let topo = diamond();
        let mut s = states(4, 1.0);
        s[1].alive = false;
        let roles = AttackRoles::empty();
        let view = route_view(&topo, &s, &roles);

        assert_eq!(ForwardingPolicy::GreedyProgress.next_hop(&view, 3), Some(2));

        s[2].alive = false;
        let view = route_view(&topo, &s, &roles);
        assert_eq!(ForwardingPolicy::GreedyProgress.next_hop(&view, 3), None);
    }

    #[test]
    fn test_sinkhole_attracts_traffic() {
        let topo = diamond();
        let s = states(4, 1.0);
        let roles = AttackRoles::empty().with_role(2, AttackRole::Sinkhole);
        let view = route_view(&topo, &s, &roles);

        assert_eq!(ForwardingPolicy::GreedyProgress.next_hop(&view, 3), Some(2));
        assert_eq!(ForwardingPolicy::EnergyWeighted.next_hop(&view, 3), Some(2));
    }

    #[test]
    fn test_energy_weighted_prefers_fuller_battery() {
        let topo = diamond();
        let mut s = states(4, 1.0);
        s[1].energy = 0.2;
        let roles = AttackRoles::empty();
        let view = route_view(&topo, &s, &roles);

        assert_eq!(ForwardingPolicy::EnergyWeighted.next_hop(&view, 3), Some(2));
        // pure progress does not care
        assert_eq!(ForwardingPolicy::GreedyProgress.next_hop(&view, 3), Some(1));
    }

    #[test]
    fn test_chain_relay_ignores_liveness() {
        let topo = diamond();
        let mut s = states(4, 1.0);
        for state in s.iter_mut().skip(1) {
            state.alive = false;
        }
        let roles = AttackRoles::empty();
        let view = route_view(&topo, &s, &roles);

        let policy = ForwardingPolicy::for_protocol(Protocol::PegasisLike, &topo);
        let chain = policy.chain().unwrap();
        assert_eq!(policy.next_hop(&view, 1), chain.successor(1));
        assert!(policy.next_hop(&view, 1).is_some());
        assert_eq!(policy.next_hop(&view, SINK_ID), None);
    }

    #[test]
    fn test_learned_gate_excludes_untrusted_and_drained() {
        let topo = diamond();
        let mut s = states(4, 1.0);
        s[1].trust = 0.29;
        let roles = AttackRoles::empty();
        let policy = ForwardingPolicy::for_protocol(Protocol::SecureMl, &topo);

        let view = route_view(&topo, &s, &roles);
        assert_eq!(policy.next_hop(&view, 3), Some(2));

        s[2].energy = 0.15;
        let view = route_view(&topo, &s, &roles);
        assert_eq!(policy.next_hop(&view, 3), None);

        s[1].trust = 0.3;
        let view = route_view(&topo, &s, &roles);
        assert_eq!(policy.next_hop(&view, 3), Some(1));
    }

    #[test]
    fn test_learned_gate_skips_energy_of_powered_sink() {
        let topo = diamond();
        let mut s = states(4, 1.0);
        s[SINK_ID].energy = 0.0;
        s[3].trust = 0.2;
        let roles = AttackRoles::empty();
        let policy = ForwardingPolicy::for_protocol(Protocol::SecureMl, &topo);

        let view = route_view(&topo, &s, &roles);
        assert_eq!(policy.next_hop(&view, 1), Some(SINK_ID));

        let battery = RouteView {
            mains_powered_sink: false,
            ..route_view(&topo, &s, &roles)
        };
        assert_eq!(policy.next_hop(&battery, 1), None);
    }

    #[test]
    fn test_learned_score_formula() {
        let topo = diamond();
        let mut s = states(4, 1.0);
        s[1].trust = 0.5;
        let roles = AttackRoles::empty();
        let view = route_view(&topo, &s, &roles);
        let q = QTable::new();

        let progress = topo.progress(3, 1);
        let link = 1.0 / (1.0 + topo.distance(3, 1));
        let degree = topo.neighbors(1).len() as f64;
        let utility = 0.35 + 0.25 * progress + 0.10 * degree + 0.10 * link + 0.20 * 0.5;
        let expected = 0.6 * utility - 0.6 * 0.5 + 0.3;

        assert!((learned_score(&view, &q, 3, 1) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_learned_values_shift_choice() {
        let topo = diamond();
        let s = states(4, 1.0);
        let roles = AttackRoles::empty();
        let mut policy = ForwardingPolicy::for_protocol(Protocol::SecureMl, &topo);

        {
            let view = route_view(&topo, &s, &roles);
            assert_eq!(policy.next_hop(&view, 3), Some(1));
        }

        policy.observe_hop(&topo, &s, 3, 2);
        assert!(policy.q_table().unwrap().value(3, 2) > 0.0);

        let view = route_view(&topo, &s, &roles);
        assert_eq!(policy.next_hop(&view, 3), Some(2));
    }

    #[test]
    fn test_only_on_demand_policies_pay_control() {
        let topo = diamond();
        assert!(ForwardingPolicy::for_protocol(Protocol::AodvLike, &topo).counts_control_packets());
        assert!(ForwardingPolicy::for_protocol(Protocol::LeachLike, &topo).counts_control_packets());
        assert!(!ForwardingPolicy::for_protocol(Protocol::PegasisLike, &topo).counts_control_packets());
        assert!(!ForwardingPolicy::for_protocol(Protocol::SecureMl, &topo).counts_control_packets());
    }
}
