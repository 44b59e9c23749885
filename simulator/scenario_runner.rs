// Scenario Runner - Load and execute scenario YAML files
//
// Usage:
//   cargo run --bin scenario_runner scenarios/baseline.yaml
//   cargo run --bin scenario_runner scenarios/  (runs all .yaml files in directory)
//   cargo run --bin scenario_runner scenarios/baseline.yaml --seed 42

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;

use wsn_rust::{compare_protocols, CsvResultWriter, Protocol, SimulationConfig};

/// Scenario file format
#[derive(Debug, serde::Deserialize)]
struct ScenarioFile {
    /// Scenario metadata
    #[serde(default)]
    meta: ScenarioMeta,

    /// Run configuration, unset fields take their defaults
    #[serde(default)]
    config: SimulationConfig,

    /// Protocols to compare (default: all four)
    #[serde(default)]
    protocols: Option<Vec<Protocol>>,

    /// Append results to this CSV file
    #[serde(default)]
    csv_out: Option<PathBuf>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct ScenarioMeta {
    name: Option<String>,
    description: Option<String>,
    hypothesis: Option<String>,
}

#[derive(Parser)]
#[command(name = "scenario_runner")]
#[command(about = "Run WSN forwarding scenarios from YAML files")]
struct Cli {
    /// Scenario file or directory of scenario files
    path: PathBuf,

    /// Override the seed of every scenario
    #[arg(long)]
    seed: Option<u64>,

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

    let scenarios = if cli.path.is_file() {
        vec![cli.path.clone()]
    } else if cli.path.is_dir() {
        scenario_files(&cli.path)
    } else {
        error!("path does not exist: {}", cli.path.display());
        return ExitCode::FAILURE;
    };

    if scenarios.is_empty() {
        error!("no .yaml files found in {}", cli.path.display());
        return ExitCode::FAILURE;
    }

    let mut failed = 0;
    for (i, path) in scenarios.iter().enumerate() {
        println!("\n{}/{} Running: {}\n", i + 1, scenarios.len(), path.display());
        if let Err(e) = run_scenario_file(path, cli.seed) {
            error!("{}: {}", path.display(), e);
            failed += 1;
        }
    }

    if failed > 0 {
        error!("{} of {} scenario(s) failed", failed, scenarios.len());
        return ExitCode::FAILURE;
    }

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  All scenarios complete!                               ║");
    println!("╚════════════════════════════════════════════════════════╝\n");
    ExitCode::SUCCESS
}

fn scenario_files(dir: &Path) -> Vec<PathBuf> {
    let mut scenarios: Vec<PathBuf> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| {
                    matches!(
                        path.extension().and_then(|s| s.to_str()),
                        Some("yaml") | Some("yml")
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    scenarios.sort();
    scenarios
}

fn run_scenario_file(path: &Path, seed: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    info!("loading scenario from {}", path.display());

    let yaml_content = fs::read_to_string(path)?;
    let scenario: ScenarioFile = serde_yaml::from_str(&yaml_content)?;

    let title = scenario.meta.name.clone().unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    println!("╔════════════════════════════════════════════════════════╗");
    println!("║  {:<54}║", title);
    println!("╚════════════════════════════════════════════════════════╝\n");

    if let Some(ref desc) = scenario.meta.description {
        println!("{}\n", desc);
    }
    if let Some(ref hypothesis) = scenario.meta.hypothesis {
        println!("Hypothesis:");
        println!("  {}\n", hypothesis);
    }

    let mut config = scenario.config;
    if let Some(seed) = seed {
        config.seed = seed;
    }

    println!("Configuration:");
    println!("  Nodes: {}", config.nodes);
    println!("  Rounds: {}", config.rounds);
    println!("  Packets/round: {}", config.packets_per_round);
    println!("  Attack fraction: {:.2}", config.attack_fraction);
    println!("  Seed: {}", config.seed);

    let protocols = scenario
        .protocols
        .unwrap_or_else(|| Protocol::ALL.to_vec());
    let results = compare_protocols(&config, &protocols)?;

    for report in results.values() {
        report.print_summary();
    }

    if let Some(csv_path) = scenario.csv_out {
        let mut writer = CsvResultWriter::append(&csv_path)?;
        for report in results.values() {
            writer.write(report)?;
        }
        writer.flush()?;
        info!("results appended to {}", csv_path.display());
    }

    println!("\n✓ Scenario complete!\n");
    Ok(())
}
