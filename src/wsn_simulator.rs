//! Round-based packet simulation
//!
//! Each round picks up to `packets_per_round` alive sensors as sources from a
//! per-round seeded shuffle and walks each packet hop by hop:
//!
//! ```text
//! Traveling ──► DeliveredToSink
//!     │──────► DroppedAdversarial   (selective forwarder swallowed it)
//!     │──────► DroppedNoRoute       (policy found no next hop)
//!     └──────► DroppedTtlExpired    (hop budget spent)
//! ```
//!
//! Every hop attempt pays radio energy, updates the receiver's trust and, for
//! the learned policy, feeds the Q-table. All randomness comes from streams
//! derived from the configured seed, so equal configurations give identical
//! runs.

use indexmap::IndexMap;
use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::wsn_attacks::AttackRoles;
use crate::wsn_config::{ConfigError, SimulationConfig};
use crate::wsn_energy::EnergyModel;
use crate::wsn_interface::{
    Event, EventSink, NoOpSink, NodeId, NodeState, PacketOutcome, Round, Topology, MAX_TTL,
    SINK_ID,
};
use crate::wsn_metrics::{Metrics, MetricsReport};
use crate::wsn_qlearning::QTable;
use crate::wsn_routing::{ForwardingPolicy, Protocol, RouteView};
use crate::wsn_topology::StaticTopology;
use crate::wsn_trust::update_trust;

/// Per-round source shuffle stream: seed + round * 73
const SHUFFLE_ROUND_STRIDE: u64 = 73;

/// Final state of a finished run
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub report: MetricsReport,
    pub states: Vec<NodeState>,
    pub q_table: Option<QTable>,
    /// blake3 over report, node states and Q-table; equal runs give equal digests
    pub digest: String,
}

pub struct RoundSimulator<'a, T: Topology, S: EventSink = NoOpSink> {
    config: SimulationConfig,
    topology: &'a T,
    roles: AttackRoles,
    policy: ForwardingPolicy,
    energy: EnergyModel,
    states: Vec<NodeState>,
    metrics: Metrics,
    events: S,
    rounds_run: usize,
}

impl<'a, T: Topology> RoundSimulator<'a, T, NoOpSink> {
    /// Validate the configuration and set up node state, attack roles and the
    /// forwarding policy for `topology`.
    pub fn new(config: SimulationConfig, topology: &'a T) -> Result<Self, ConfigError> {
        config.validate()?;
        if topology.node_count() != config.nodes {
            return Err(ConfigError::TopologyMismatch {
                configured: config.nodes,
                topology: topology.node_count(),
            });
        }

        let roles = AttackRoles::assign(config.nodes, config.attack_fraction, config.seed)
            .with_drop_probability(config.drop_probability);
        let policy = ForwardingPolicy::for_protocol(config.protocol, topology);
        let states = (0..config.nodes)
            .map(|id| NodeState::new(id, config.initial_energy))
            .collect();

        debug!(
            "roles: sybil={:?} sinkhole={:?} selective={:?}",
            roles.sybil(),
            roles.sinkhole(),
            roles.selective()
        );

        Ok(Self {
            energy: EnergyModel::new(config.mains_powered_sink),
            config,
            topology,
            roles,
            policy,
            states,
            metrics: Metrics::default(),
            events: NoOpSink,
            rounds_run: 0,
        })
    }
}

impl<'a, T: Topology, S: EventSink> RoundSimulator<'a, T, S> {
    /// Replace the seeded attack assignment, for hand-built scenarios
    pub fn with_roles(mut self, roles: AttackRoles) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_event_sink<S2: EventSink>(self, events: S2) -> RoundSimulator<'a, T, S2> {
        RoundSimulator {
            config: self.config,
            topology: self.topology,
            roles: self.roles,
            policy: self.policy,
            energy: self.energy,
            states: self.states,
            metrics: self.metrics,
            events,
            rounds_run: self.rounds_run,
        }
    }

    /// Run all configured rounds
    pub fn run(mut self) -> SimulationOutcome {
        info!(
            "{}: {} nodes, {} rounds, {} compromised, seed {}",
            self.config.protocol,
            self.config.nodes,
            self.config.rounds,
            self.roles.compromised_count(),
            self.config.seed
        );

        for round in 0..self.config.rounds {
            self.run_round(round);
        }

        let outcome = self.finish();
        info!(
            "{}: delivered {}/{} (pdr {:.3}), fnd {}",
            outcome.report.protocol,
            outcome.report.delivered,
            outcome.report.generated,
            outcome.report.delivery_ratio,
            outcome.report.fnd_round
        );
        outcome
    }

    /// Select this round's sources and route one packet from each
    pub fn run_round(&mut self, round: Round) {
        let sources = self.select_sources(round);
        self.run_round_with_sources(round, &sources);
    }

    /// Route one packet from each of `sources`, then check for first death
    pub fn run_round_with_sources(&mut self, round: Round, sources: &[NodeId]) {
        for &source in sources {
            let (outcome, hops) = self.route_packet(round, source);
            self.metrics.record_packet(outcome, hops);
            self.events.log(
                round,
                source,
                Event::PacketFinished {
                    source,
                    outcome,
                    hops,
                },
            );
        }

        self.metrics.check_first_death(&self.states, round);
        self.rounds_run = self.rounds_run.max(round + 1);
    }

    /// Alive sensors in a per-round seeded order, cut to the quota
    pub fn select_sources(&self, round: Round) -> Vec<NodeId> {
        let mut sources: Vec<NodeId> = self
            .states
            .iter()
            .filter(|s| s.id != SINK_ID && s.alive)
            .map(|s| s.id)
            .collect();

        let stream = self
            .config
            .seed
            .wrapping_add((round as u64).wrapping_mul(SHUFFLE_ROUND_STRIDE));
        sources.shuffle(&mut StdRng::seed_from_u64(stream));
        sources.truncate(self.config.packets_per_round);
        sources
    }

    /// Walk one packet from `source` until it reaches a terminal state.
    /// Returns the outcome and the number of hops attempted.
    pub fn route_packet(&mut self, round: Round, source: NodeId) -> (PacketOutcome, u32) {
        let mut ttl = MAX_TTL;
        let mut hops: u32 = 0;
        let mut current = source;

        while ttl > 0 && current != SINK_ID && self.states[current].alive {
            ttl -= 1;
            hops += 1;

            if self.policy.counts_control_packets() {
                self.metrics.control_packets += 1;
            }

            let view = RouteView {
                topology: self.topology,
                states: &self.states,
                roles: &self.roles,
                mains_powered_sink: self.config.mains_powered_sink,
            };
            let next = match self.policy.next_hop(&view, current) {
                Some(next) => next,
                None => return (PacketOutcome::DroppedNoRoute, hops),
            };

            let dropped = self.roles.should_drop(next, self.config.seed, round, hops);

            // the hop is paid for either way
            self.apply_energy(round, current, next);

            if dropped {
                update_trust(&mut self.states, &self.roles, next, false);
                self.events.log(
                    round,
                    next,
                    Event::SelectiveDrop {
                        from: current,
                        to: next,
                        hop: hops,
                    },
                );
                return (PacketOutcome::DroppedAdversarial, hops);
            }

            update_trust(&mut self.states, &self.roles, next, true);
            self.policy
                .observe_hop(self.topology, &self.states, current, next);

            trace!("{} hop {}: {} -> {}", round, hops, current, next);
            self.events.log(
                round,
                current,
                Event::HopForwarded {
                    from: current,
                    to: next,
                    hop: hops,
                },
            );
            if next != SINK_ID {
                let shade = self.energy_shade(next);
                self.events
                    .log(round, next, Event::EnergyShade { node: next, shade });
            }

            current = next;
        }

        let outcome = if current == SINK_ID {
            PacketOutcome::DeliveredToSink
        } else if ttl == 0 {
            PacketOutcome::DroppedTtlExpired
        } else {
            // stranded on a node that ran dry
            PacketOutcome::DroppedNoRoute
        };
        (outcome, hops)
    }

    fn apply_energy(&mut self, round: Round, src: NodeId, dst: NodeId) {
        for node in self.energy.apply(&mut self.states, src, dst) {
            debug!("{} node {} died", round, node);
            self.events.log(round, node, Event::NodeDied { node });
        }
        self.metrics.total_energy_spent = self.energy.total_spent();
    }

    /// `energy / initial_energy` scaled to a 0..=255 shade
    fn energy_shade(&self, node: NodeId) -> u8 {
        let ratio = self.states[node].energy / self.config.initial_energy;
        (ratio * 255.0).clamp(0.0, 255.0) as u8
    }

    /// Build the per-run record and determinism digest
    pub fn finish(self) -> SimulationOutcome {
        let nodes_dead = self.states.iter().filter(|s| !s.alive).count();
        let report = self.metrics.report(
            self.config.protocol,
            self.config.nodes,
            self.rounds_run,
            nodes_dead,
        );
        let q_table = self.policy.q_table().cloned();
        let digest = state_digest(&report, &self.states, q_table.as_ref());

        SimulationOutcome {
            report,
            states: self.states,
            q_table,
            digest,
        }
    }

    pub fn states(&self) -> &[NodeState] {
        &self.states
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn roles(&self) -> &AttackRoles {
        &self.roles
    }

    pub fn policy(&self) -> &ForwardingPolicy {
        &self.policy
    }

    pub fn event_sink(&self) -> &S {
        &self.events
    }
}

fn state_digest(report: &MetricsReport, states: &[NodeState], q_table: Option<&QTable>) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(report.csv_row().as_bytes());

    for s in states {
        hasher.update(&(s.id as u64).to_le_bytes());
        hasher.update(&s.energy.to_bits().to_le_bytes());
        hasher.update(&s.trust.to_bits().to_le_bytes());
        hasher.update(&[s.alive as u8]);
    }

    if let Some(q) = q_table {
        for ((state, action), value) in q.entries_sorted() {
            hasher.update(&(state as u64).to_le_bytes());
            hasher.update(&(action as u64).to_le_bytes());
            hasher.update(&value.to_bits().to_le_bytes());
        }
    }

    hasher.finalize().to_hex().to_string()
}

/// Place nodes from the configured seed and run the configured protocol
pub fn run_protocol(config: &SimulationConfig) -> Result<SimulationOutcome, ConfigError> {
    config.validate()?;
    let topology = StaticTopology::random_placement(
        config.width,
        config.height,
        config.nodes,
        config.comm_range,
        config.seed,
    );
    Ok(RoundSimulator::new(config.clone(), &topology)?.run())
}

/// Run all four protocols over the same placement and attackers
pub fn compare_all(config: &SimulationConfig) -> Result<IndexMap<Protocol, MetricsReport>, ConfigError> {
    compare_protocols(config, &Protocol::ALL)
}

pub fn compare_protocols(
    config: &SimulationConfig,
    protocols: &[Protocol],
) -> Result<IndexMap<Protocol, MetricsReport>, ConfigError> {
    config.validate()?;
    let topology = StaticTopology::random_placement(
        config.width,
        config.height,
        config.nodes,
        config.comm_range,
        config.seed,
    );

    let mut results = IndexMap::new();
    for &protocol in protocols {
        let outcome = RoundSimulator::new(config.with_protocol(protocol), &topology)?.run();
        results.insert(protocol, outcome.report);
    }
    Ok(results)
}
