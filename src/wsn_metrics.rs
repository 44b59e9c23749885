//! Run metrics and result output

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::wsn_interface::{NodeState, PacketOutcome, Round, SINK_ID};
use crate::wsn_routing::Protocol;

// ============================================================================
// Accumulators
// ============================================================================

/// Counters mutated by the round loop
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    pub generated: u64,
    pub delivered: u64,
    pub control_packets: u64,
    pub dropped_adversarial: u64,
    pub dropped_no_route: u64,
    pub dropped_ttl_expired: u64,
    /// Sum of hop counts over delivered packets
    pub total_delay: f64,
    pub total_energy_spent: f64,
    pub first_death_round: Option<Round>,
}

impl Metrics {
    /// Account one finished packet
    pub fn record_packet(&mut self, outcome: PacketOutcome, hops: u32) {
        self.generated += 1;
        match outcome {
            PacketOutcome::DeliveredToSink => {
                self.delivered += 1;
                self.total_delay += f64::from(hops);
            }
            PacketOutcome::DroppedAdversarial => self.dropped_adversarial += 1,
            PacketOutcome::DroppedNoRoute => self.dropped_no_route += 1,
            PacketOutcome::DroppedTtlExpired => self.dropped_ttl_expired += 1,
        }
    }

    /// Latch the first round ending with a dead sensor
    pub fn check_first_death(&mut self, states: &[NodeState], round: Round) {
        if self.first_death_round.is_none()
            && states.iter().any(|s| s.id != SINK_ID && !s.alive)
        {
            self.first_death_round = Some(round);
        }
    }

    pub fn report(&self, protocol: Protocol, nodes: usize, rounds: usize, nodes_dead: usize) -> MetricsReport {
        let per_delivered = |value: f64| {
            if self.delivered > 0 {
                value / self.delivered as f64
            } else {
                0.0
            }
        };

        MetricsReport {
            protocol,
            nodes,
            rounds,
            generated: self.generated,
            delivered: self.delivered,
            delivery_ratio: if self.generated > 0 {
                self.delivered as f64 / self.generated as f64
            } else {
                0.0
            },
            avg_delay: per_delivered(self.total_delay),
            energy_per_packet: per_delivered(self.total_energy_spent),
            routing_overhead: per_delivered(self.control_packets as f64),
            fnd_round: self.first_death_round.map_or(-1, |r| r as i64),
            dropped_adversarial: self.dropped_adversarial,
            dropped_no_route: self.dropped_no_route,
            dropped_ttl_expired: self.dropped_ttl_expired,
            nodes_dead,
        }
    }
}

// ============================================================================
// Report
// ============================================================================

/// One record per run
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MetricsReport {
    pub protocol: Protocol,
    pub nodes: usize,
    pub rounds: usize,
    pub generated: u64,
    pub delivered: u64,
    /// delivered / generated
    pub delivery_ratio: f64,
    /// Mean hops per delivered packet
    pub avg_delay: f64,
    /// Joules spent per delivered packet
    pub energy_per_packet: f64,
    /// Control packets per delivered packet
    pub routing_overhead: f64,
    /// First round ending with a dead sensor, -1 if none
    pub fnd_round: i64,
    pub dropped_adversarial: u64,
    pub dropped_no_route: u64,
    pub dropped_ttl_expired: u64,
    pub nodes_dead: usize,
}

impl MetricsReport {
    pub const CSV_HEADER: &'static str = "protocol,nodes,rounds,generated,delivered,pdr,avg_delay,\
energy_per_packet,routing_overhead,fnd_round,dropped_adversarial,dropped_no_route,\
dropped_ttl_expired,nodes_dead";

    pub fn csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            self.protocol,
            self.nodes,
            self.rounds,
            self.generated,
            self.delivered,
            self.delivery_ratio,
            self.avg_delay,
            self.energy_per_packet,
            self.routing_overhead,
            self.fnd_round,
            self.dropped_adversarial,
            self.dropped_no_route,
            self.dropped_ttl_expired,
            self.nodes_dead
        )
    }

    pub fn print_summary(&self) {
        println!("\n╔════════════════════════════════════════════════════════╗");
        println!("║  {:<54}║", format!("Protocol: {}", self.protocol));
        println!("╚════════════════════════════════════════════════════════╝\n");

        println!("Configuration:");
        println!("  Nodes: {}", self.nodes);
        println!("  Rounds: {}\n", self.rounds);

        println!("Delivery:");
        println!("  Generated: {}", self.generated);
        println!(
            "  Delivered: {} ({:.1}%)",
            self.delivered,
            self.delivery_ratio * 100.0
        );
        println!(
            "  Dropped: adversarial={} no_route={} ttl={}",
            self.dropped_adversarial, self.dropped_no_route, self.dropped_ttl_expired
        );
        println!("  Avg delay: {:.2} hops\n", self.avg_delay);

        println!("Cost:");
        println!("  Energy per packet: {:.4} J", self.energy_per_packet);
        println!("  Routing overhead: {:.2} ctrl/pkt", self.routing_overhead);
        println!("  First node death: round {}", self.fnd_round);
        println!("  Dead nodes at end: {}", self.nodes_dead);
    }
}

// ============================================================================
// CSV Output
// ============================================================================

/// Appends report rows to a CSV file, writing the header only for a new file
pub struct CsvResultWriter {
    writer: BufWriter<File>,
}

impl CsvResultWriter {
    pub fn append<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let is_new = !path.exists();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        if is_new {
            writeln!(writer, "{}", MetricsReport::CSV_HEADER)?;
        }

        Ok(Self { writer })
    }

    pub fn write(&mut self, report: &MetricsReport) -> io::Result<()> {
        writeln!(self.writer, "{}", report.csv_row())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
