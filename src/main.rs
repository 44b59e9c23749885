//! Compare all four forwarding policies on one deployment
//!
//! Run with: cargo run --bin wsn_compare -- --nodes 80 --rounds 200

use std::process::ExitCode;

use clap::Parser;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;

use wsn_rust::{compare_protocols, CsvResultWriter, Protocol, SimulationConfig};

/// Secure WSN routing benchmark
#[derive(Parser)]
#[command(name = "wsn_compare")]
#[command(about = "Compare forwarding policies under energy depletion and attacks")]
#[command(version)]
struct Cli {
    /// Number of nodes including the sink
    #[arg(long, default_value_t = 80)]
    nodes: usize,

    /// Simulation rounds
    #[arg(long, default_value_t = 200)]
    rounds: usize,

    /// Packets generated each round
    #[arg(long, default_value_t = 20)]
    packets_per_round: usize,

    /// Fraction of malicious nodes
    #[arg(long, default_value_t = 0.1)]
    attack_fraction: f64,

    /// Communication range (m)
    #[arg(long, default_value_t = 120.0)]
    comm_range: f64,

    /// Initial energy per node (J)
    #[arg(long, default_value_t = 2.0)]
    initial_energy: f64,

    /// Random seed
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Run only this protocol (aodv_like|leach_like|pegasis_like|secure_ml)
    #[arg(long)]
    protocol: Option<Protocol>,

    /// Append one CSV row per protocol to this file
    #[arg(long)]
    csv_out: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new().with_level(level).init().unwrap();

    let config = SimulationConfig {
        nodes: cli.nodes,
        rounds: cli.rounds,
        packets_per_round: cli.packets_per_round,
        attack_fraction: cli.attack_fraction,
        comm_range: cli.comm_range,
        initial_energy: cli.initial_energy,
        seed: cli.seed,
        ..Default::default()
    };

    let protocols: Vec<Protocol> = match cli.protocol {
        Some(p) => vec![p],
        None => Protocol::ALL.to_vec(),
    };

    let results = match compare_protocols(&config, &protocols) {
        Ok(results) => results,
        Err(e) => {
            error!("invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &cli.csv_out {
        let written = CsvResultWriter::append(path).and_then(|mut writer| {
            for report in results.values() {
                writer.write(report)?;
            }
            writer.flush()
        });
        match written {
            Ok(()) => info!("results appended to {}", path),
            Err(e) => {
                error!("failed to write {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        }
    }

    match serde_json::to_string_pretty(&results) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("failed to encode results: {}", e);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
