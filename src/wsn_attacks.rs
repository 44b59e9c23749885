// adversarial role assignment and selective-drop injection

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::wsn_interface::{NodeId, Round, SINK_ID};

/// Offset keeping the assignment shuffle apart from every other seeded stream
const ASSIGNMENT_SEED_OFFSET: u64 = 997;

// per-hop drop stream: seed + round * 131 + hop * 17 + node
const DROP_ROUND_STRIDE: u64 = 131;
const DROP_HOP_STRIDE: u64 = 17;

pub const DEFAULT_DROP_PROBABILITY: f64 = 0.45;

/// Sinkhole nodes advertise inflated route quality
pub const SINKHOLE_MULTIPLIER: f64 = 1.8;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AttackRole {
    Sybil,
    Sinkhole,
    Selective,
}

/// Three disjoint sets of compromised sensors, fixed for the run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttackRoles {
    sybil: BTreeSet<NodeId>,
    sinkhole: BTreeSet<NodeId>,
    selective: BTreeSet<NodeId>,
    drop_probability: f64,
}

impl AttackRoles {
    /// Shuffle sensors `1..nodes` from the assignment stream, compromise the
    /// first `floor(nodes * fraction)` and cut them into sybil, sinkhole and
    /// selective slices.
    ///
    /// `fraction` must already be validated to lie in `[0, 1]`.
    pub fn assign(nodes: usize, fraction: f64, seed: u64) -> Self {
        let mut roles = Self::empty();

        let compromised = (nodes as f64 * fraction).floor() as usize;
        if compromised == 0 || nodes <= 1 {
            return roles;
        }

        let mut ids: Vec<NodeId> = (1..nodes).collect();
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(ASSIGNMENT_SEED_OFFSET));
        ids.shuffle(&mut rng);
        ids.truncate(compromised);

        let split = (ids.len() / 3).max(1);
        for (i, id) in ids.into_iter().enumerate() {
            if i < split {
                roles.sybil.insert(id);
            } else if i < 2 * split {
                roles.sinkhole.insert(id);
            } else {
                roles.selective.insert(id);
            }
        }

        roles
    }

    pub fn empty() -> Self {
        Self {
            drop_probability: DEFAULT_DROP_PROBABILITY,
            ..Default::default()
        }
    }

    /// Place `node` in `role` directly, for hand-built scenarios.
    pub fn with_role(mut self, node: NodeId, role: AttackRole) -> Self {
        assert_ne!(node, SINK_ID, "the sink can not be compromised");
        self.sybil.remove(&node);
        self.sinkhole.remove(&node);
        self.selective.remove(&node);
        match role {
            AttackRole::Sybil => self.sybil.insert(node),
            AttackRole::Sinkhole => self.sinkhole.insert(node),
            AttackRole::Selective => self.selective.insert(node),
        };
        self
    }

    pub fn with_drop_probability(mut self, probability: f64) -> Self {
        self.drop_probability = probability;
        self
    }

    pub fn role(&self, node: NodeId) -> Option<AttackRole> {
        if self.sybil.contains(&node) {
            Some(AttackRole::Sybil)
        } else if self.sinkhole.contains(&node) {
            Some(AttackRole::Sinkhole)
        } else if self.selective.contains(&node) {
            Some(AttackRole::Selective)
        } else {
            None
        }
    }

    pub fn is_sybil(&self, node: NodeId) -> bool {
        self.sybil.contains(&node)
    }

    pub fn is_sinkhole(&self, node: NodeId) -> bool {
        self.sinkhole.contains(&node)
    }

    pub fn is_selective(&self, node: NodeId) -> bool {
        self.selective.contains(&node)
    }

    pub fn compromised_count(&self) -> usize {
        self.sybil.len() + self.sinkhole.len() + self.selective.len()
    }

    pub fn sybil(&self) -> &BTreeSet<NodeId> {
        &self.sybil
    }

    pub fn sinkhole(&self) -> &BTreeSet<NodeId> {
        &self.sinkhole
    }

    pub fn selective(&self) -> &BTreeSet<NodeId> {
        &self.selective
    }

    /// Multiplier applied to a candidate's routing score.
    pub fn advertised_multiplier(&self, node: NodeId) -> f64 {
        if self.is_sinkhole(node) {
            SINKHOLE_MULTIPLIER
        } else {
            1.0
        }
    }

    /// Does `node` drop the packet arriving on `hop` of `round`?
    ///
    /// Each decision draws from its own generator, so the answer for a given
    /// (seed, round, hop, node) never depends on anything else drawn in the run.
    pub fn should_drop(&self, node: NodeId, seed: u64, round: Round, hop: u32) -> bool {
        if !self.is_selective(node) {
            return false;
        }

        let stream = seed
            .wrapping_add((round as u64).wrapping_mul(DROP_ROUND_STRIDE))
            .wrapping_add(u64::from(hop).wrapping_mul(DROP_HOP_STRIDE))
            .wrapping_add(node as u64);
        let mut rng = StdRng::seed_from_u64(stream);
        rng.gen::<f64>() < self.drop_probability
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_disjoint_and_excludes_sink() {
        let roles = AttackRoles::assign(100, 0.3, 7);

        assert_eq!(roles.compromised_count(), 30);
        assert_eq!(roles.sybil().len(), 10);
        assert_eq!(roles.sinkhole().len(), 10);
        assert_eq!(roles.selective().len(), 10);
        assert!(roles.sybil().is_disjoint(roles.sinkhole()));
        assert!(roles.sybil().is_disjoint(roles.selective()));
        assert!(roles.sinkhole().is_disjoint(roles.selective()));
        assert!(roles.role(SINK_ID).is_none());
    }

    #[test]
    fn test_assign_remainder_goes_to_selective() {
        // 11 compromised: 3 / 3 / 5
        let roles = AttackRoles::assign(110, 0.1, 3);

        assert_eq!(roles.sybil().len(), 3);
        assert_eq!(roles.sinkhole().len(), 3);
        assert_eq!(roles.selective().len(), 5);
    }

    #[test]
    fn test_assign_zero_fraction() {
        let roles = AttackRoles::assign(50, 0.0, 1);
        assert_eq!(roles.compromised_count(), 0);

        // floor(5 * 0.1) == 0
        let roles = AttackRoles::assign(5, 0.1, 1);
        assert_eq!(roles.compromised_count(), 0);
    }

    #[test]
    fn test_assign_deterministic() {
        assert_eq!(AttackRoles::assign(80, 0.2, 42), AttackRoles::assign(80, 0.2, 42));
        assert_ne!(AttackRoles::assign(80, 0.2, 42), AttackRoles::assign(80, 0.2, 43));
    }

    #[test]
    fn test_full_compromise_caps_at_sensor_count() {
        let roles = AttackRoles::assign(10, 1.0, 5);
        assert_eq!(roles.compromised_count(), 9);
    }

    #[test]
    fn test_only_selective_nodes_drop() {
        let roles = AttackRoles::empty()
            .with_role(1, AttackRole::Sybil)
            .with_role(2, AttackRole::Sinkhole)
            .with_drop_probability(1.0);

        for round in 0..20 {
            for hop in 1..5 {
                assert!(!roles.should_drop(1, 9, round, hop));
                assert!(!roles.should_drop(2, 9, round, hop));
                assert!(!roles.should_drop(3, 9, round, hop));
            }
        }
    }

    #[test]
    fn test_drop_decision_reproducible() {
        let roles = AttackRoles::empty().with_role(4, AttackRole::Selective);

        let first: Vec<bool> = (0..200).map(|r| roles.should_drop(4, 7, r, 2)).collect();
        let second: Vec<bool> = (0..200).map(|r| roles.should_drop(4, 7, r, 2)).collect();
        assert_eq!(first, second);

        // roughly 45% of draws
        let drops = first.iter().filter(|d| **d).count();
        assert!(drops > 50 && drops < 130, "drops = {}", drops);
    }

    #[test]
    fn test_forced_drop() {
        let roles = AttackRoles::empty()
            .with_role(1, AttackRole::Selective)
            .with_drop_probability(1.0);
        assert!(roles.should_drop(1, 0, 0, 1));

        let roles = roles.with_drop_probability(0.0);
        assert!(!roles.should_drop(1, 0, 0, 1));
    }

    #[test]
    fn test_sinkhole_multiplier() {
        let roles = AttackRoles::empty().with_role(3, AttackRole::Sinkhole);
        assert_eq!(roles.advertised_multiplier(3), SINKHOLE_MULTIPLIER);
        assert_eq!(roles.advertised_multiplier(2), 1.0);
    }
}
