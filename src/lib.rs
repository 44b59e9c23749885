//! # wsn_rust - Trust-Aware Forwarding in Wireless Sensor Networks
//!
//! A round-based simulator that measures how packet-forwarding strategies hold
//! up when sensors run out of battery and some of them are compromised.
//!
//! ## Core Components
//!
//! - **ForwardingPolicy**: greedy progress, energy-weighted, chain relay and a
//!   trust-gated learned policy
//! - **AttackRoles**: seeded sybil / sinkhole / selective-forwarder assignment
//!   and per-hop drop decisions
//! - **Trust / Energy**: per-node reputation and battery bookkeeping
//! - **QTable**: one-step Q-learning over (node, next hop) pairs
//! - **RoundSimulator**: drives packets hop by hop and aggregates `Metrics`
//!
//! ## Usage
//!
//! ```no_run
//! use wsn_rust::{compare_all, SimulationConfig};
//!
//! let config = SimulationConfig {
//!     nodes: 35,
//!     rounds: 40,
//!     ..Default::default()
//! };
//!
//! for (protocol, report) in compare_all(&config).unwrap() {
//!     println!("{}: pdr {:.3}", protocol, report.delivery_ratio);
//! }
//! ```
//!
//! Bring your own placement by implementing [`Topology`] and handing it to
//! [`RoundSimulator::new`]. Runs are fully determined by the configuration:
//! placement, attacker choice, source order and every drop decision come from
//! separate streams derived from `SimulationConfig::seed`.

pub mod wsn_attacks;
pub mod wsn_chain;
pub mod wsn_config;
pub mod wsn_energy;
pub mod wsn_interface;
pub mod wsn_metrics;
pub mod wsn_qlearning;
pub mod wsn_routing;
pub mod wsn_simulator;
pub mod wsn_topology;
pub mod wsn_trust;

// Re-export commonly used types
pub use wsn_attacks::{AttackRole, AttackRoles};
pub use wsn_config::{ConfigError, SimulationConfig};
pub use wsn_interface::{
    Event, EventSink, LoggingEventSink, NoOpSink, NodeId, NodeState, PacketOutcome, Topology,
    SINK_ID,
};
pub use wsn_metrics::{CsvResultWriter, Metrics, MetricsReport};
pub use wsn_routing::{ForwardingPolicy, Protocol};
pub use wsn_simulator::{compare_all, compare_protocols, run_protocol, RoundSimulator, SimulationOutcome};
pub use wsn_topology::{Position, StaticTopology};
