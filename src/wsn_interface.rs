// shared types for the forwarding engine

// node ids index straight into the node-state vector
pub type NodeId = usize;
pub type Round = usize;

/// The sink is always node 0. It is never a packet source and never attacked.
pub const SINK_ID: NodeId = 0;

/// Hop budget a packet starts with.
pub const MAX_TTL: u32 = 15;

// radio costs per hop (joules)
pub const ENERGY_TX: f64 = 0.004;
pub const ENERGY_RX: f64 = 0.002;

pub const INITIAL_TRUST: f64 = 1.0;

#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize)]
pub struct NodeState {
    pub id: NodeId,
    pub energy: f64,
    pub trust: f64,
    pub alive: bool,
}

impl NodeState {
    pub fn new(id: NodeId, energy: f64) -> Self {
        Self {
            id,
            energy,
            trust: INITIAL_TRUST,
            alive: true,
        }
    }
}

/// Read-only view of the deployed network.
///
/// Adjacency is fixed for the lifetime of a run; dead nodes stay in the
/// neighbor lists and consumers filter on `NodeState::alive`. Asking for a
/// node id outside `0..node_count()` is an invariant violation and panics.
pub trait Topology {
    fn node_count(&self) -> usize;

    /// Neighbors of `node` in ascending id order.
    fn neighbors(&self, node: NodeId) -> &[NodeId];

    fn distance(&self, a: NodeId, b: NodeId) -> f64;

    /// Reduction in distance-to-sink gained by forwarding from `from` to `to`
    fn progress(&self, from: NodeId, to: NodeId) -> f64 {
        self.distance(from, SINK_ID) - self.distance(to, SINK_ID)
    }
}

/// Terminal state of a packet's journey.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PacketOutcome {
    DeliveredToSink,
    DroppedAdversarial,
    DroppedNoRoute,
    DroppedTtlExpired,
}

impl PacketOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PacketOutcome::DeliveredToSink => "delivered",
            PacketOutcome::DroppedAdversarial => "dropped_adversarial",
            PacketOutcome::DroppedNoRoute => "dropped_no_route",
            PacketOutcome::DroppedTtlExpired => "dropped_ttl_expired",
        }
    }
}

// ============================================================================
// Event Logging System
// ============================================================================

/// Observational events emitted by the round loop. Nothing fed to a sink
/// flows back into the simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A hop was paid for and the payload moved on
    HopForwarded { from: NodeId, to: NodeId, hop: u32 },
    /// Energy shade for a relay, `energy / initial_energy` scaled to 0..=255
    EnergyShade { node: NodeId, shade: u8 },
    /// A selective forwarder swallowed the packet
    SelectiveDrop { from: NodeId, to: NodeId, hop: u32 },
    /// A node ran out of energy
    NodeDied { node: NodeId },
    /// The packet reached a terminal state
    PacketFinished {
        source: NodeId,
        outcome: PacketOutcome,
        hops: u32,
    },
}

/// Trait for consuming events from the round loop
pub trait EventSink {
    fn log(&mut self, round: Round, node: NodeId, event: Event);
}

/// No-op event sink for plain metric runs
pub struct NoOpSink;

impl EventSink for NoOpSink {
    #[inline(always)]
    fn log(&mut self, _round: Round, _node: NodeId, _event: Event) {}
}

/// Forwards every event to the `log` facade (per-hop events at trace level)
pub struct LoggingEventSink;

impl EventSink for LoggingEventSink {
    fn log(&mut self, round: Round, node: NodeId, event: Event) {
        match event {
            Event::HopForwarded { from, to, hop } => {
                log::trace!("{} hop: n:{} {} -> {} #{}", round, node, from, to, hop)
            }
            Event::EnergyShade { node, shade } => {
                log::trace!("{} shade: n:{} {}", round, node, shade)
            }
            Event::SelectiveDrop { from, to, hop } => {
                log::debug!("{} drop: n:{} {} -> {} #{}", round, node, from, to, hop)
            }
            Event::NodeDied { node } => log::info!("{} dead: n:{}", round, node),
            Event::PacketFinished {
                source,
                outcome,
                hops,
            } => log::debug!(
                "{} pkt: src:{} {} after {} hops",
                round,
                source,
                outcome.as_str(),
                hops
            ),
        }
    }
}

/// Collects events in memory, used by tests and trace tooling
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<(Round, NodeId, Event)>,
}

impl EventSink for RecordingSink {
    fn log(&mut self, round: Round, node: NodeId, event: Event) {
        self.events.push((round, node, event));
    }
}
