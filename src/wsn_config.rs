//! Run configuration
//!
//! Everything a single run depends on. Two runs with equal configurations
//! produce identical results.

use thiserror::Error;

use crate::wsn_attacks::DEFAULT_DROP_PROBABILITY;
use crate::wsn_routing::Protocol;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("a network needs at least one node (the sink)")]
    NoNodes,

    #[error("attack fraction {0} is outside [0, 1]")]
    FractionOutOfRange(f64),

    #[error("communication range {0} must be positive")]
    InvalidRange(f64),

    #[error("initial energy {0} must be positive")]
    InvalidEnergy(f64),

    #[error("field size {0} x {1} must be positive")]
    InvalidField(f64, f64),

    #[error("drop probability {0} is outside [0, 1]")]
    InvalidProbability(f64),

    #[error("configuration has {configured} nodes but the topology has {topology}")]
    TopologyMismatch { configured: usize, topology: usize },

    #[error("unknown protocol '{0}' (expected aodv_like, leach_like, pegasis_like or secure_ml)")]
    UnknownProtocol(String),
}

/// Main configuration for a forwarding simulation
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Forwarding policy under test
    pub protocol: Protocol,

    /// Deployment field width (m)
    pub width: f64,

    /// Deployment field height (m)
    pub height: f64,

    /// Number of nodes including the sink
    pub nodes: usize,

    /// Radio range (m)
    pub comm_range: f64,

    /// Battery per node at deployment (J)
    pub initial_energy: f64,

    /// Total simulation rounds
    pub rounds: usize,

    /// Packets generated each round, at most one per alive sensor
    pub packets_per_round: usize,

    /// Fraction of nodes compromised
    pub attack_fraction: f64,

    /// Chance a selective forwarder drops a packet
    pub drop_probability: f64,

    /// Sink is debited energy but never dies
    pub mains_powered_sink: bool,

    /// Root seed for placement, attacks, source shuffling and drops
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::SecureMl,
            width: 500.0,
            height: 500.0,
            nodes: 80,
            comm_range: 120.0,
            initial_energy: 2.0,
            rounds: 200,
            packets_per_round: 20,
            attack_fraction: 0.1,
            drop_probability: DEFAULT_DROP_PROBABILITY,
            mains_powered_sink: true,
            seed: 7,
        }
    }
}

impl SimulationConfig {
    /// Reject configurations the engine has no defined behavior for
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nodes == 0 {
            return Err(ConfigError::NoNodes);
        }
        if !(0.0..=1.0).contains(&self.attack_fraction) {
            return Err(ConfigError::FractionOutOfRange(self.attack_fraction));
        }
        if self.comm_range.is_nan() || self.comm_range <= 0.0 {
            return Err(ConfigError::InvalidRange(self.comm_range));
        }
        if self.initial_energy.is_nan() || self.initial_energy <= 0.0 {
            return Err(ConfigError::InvalidEnergy(self.initial_energy));
        }
        let field_ok = |v: f64| !v.is_nan() && v > 0.0;
        if !field_ok(self.width) || !field_ok(self.height) {
            return Err(ConfigError::InvalidField(self.width, self.height));
        }
        if !(0.0..=1.0).contains(&self.drop_probability) {
            return Err(ConfigError::InvalidProbability(self.drop_probability));
        }
        Ok(())
    }

    pub fn with_protocol(&self, protocol: Protocol) -> Self {
        Self {
            protocol,
            ..self.clone()
        }
    }
}
