use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use parachute_simulation::constants::DRIFT_SAMPLE_INTERVAL;
use parachute_simulation::dispersion::{run_dispersion, DispersionConfig};
use parachute_simulation::telemetry_system::drift::{default_wind_speeds, drift_profiles};
use parachute_simulation::telemetry_system::export::{
    save_trajectory_csv, write_drift_csv, write_result_json,
};
use parachute_simulation::telemetry_system::telemetry::{format_altitude, format_time};
use parachute_simulation::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "parachute_sim")]
#[command(about = "Parachute recovery descent simulator")]
#[command(version)]
struct Cli {
    /// Log filter, e.g. "info" or "parachute_simulation=debug"
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate one descent
    Run {
        /// JSON configuration; the built-in dual-event example when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the trajectory samples as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write the flight summary and stage transitions as JSON
        #[arg(long)]
        summary_json: Option<PathBuf>,

        /// Print landing drift for 0 to 20 m/s of wind
        #[arg(long)]
        drift: bool,

        /// Write the drift profiles as CSV
        #[arg(long)]
        drift_csv: Option<PathBuf>,
    },
    /// Monte-Carlo sweep over the canopy drag coefficients
    Dispersion {
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long, default_value_t = 100)]
        runs: usize,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Relative uncertainty of the reefed Cd
        #[arg(long, default_value_t = 0.15)]
        reefed_cd_uncertainty: f64,

        /// Relative uncertainty of the open Cd
        #[arg(long, default_value_t = 0.05)]
        open_cd_uncertainty: f64,
    },
    /// Print the example configuration as JSON
    Template,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_new(&cli.log_level).context("invalid log filter")?)
        .init();

    match cli.command {
        Commands::Run {
            config,
            csv,
            summary_json,
            drift,
            drift_csv,
        } => run_single(
            config.as_deref(),
            csv.as_deref(),
            summary_json.as_deref(),
            drift,
            drift_csv.as_deref(),
        ),
        Commands::Dispersion {
            config,
            runs,
            seed,
            reefed_cd_uncertainty,
            open_cd_uncertainty,
        } => {
            let base = load_config(config.as_deref())?;
            let dispersion = DispersionConfig {
                runs,
                seed,
                reefed_cd_uncertainty,
                open_cd_uncertainty,
            };
            let report = run_dispersion(&base, &dispersion).context("dispersion failed")?;
            print!("{}", report);
            Ok(())
        }
        Commands::Template => {
            println!("{}", SimulationConfig::example_dual_event().to_json_string()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            SimulationConfig::from_json_str(&json)
                .with_context(|| format!("invalid configuration in {}", path.display()))
        }
        None => Ok(SimulationConfig::example_dual_event()),
    }
}

fn run_single(
    config_path: Option<&Path>,
    csv_path: Option<&Path>,
    summary_path: Option<&Path>,
    show_drift: bool,
    drift_path: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let result = run(&config).context("simulation failed")?;

    println!("{} descent from {}", config.kind.label(), format_altitude(config.initial_altitude));
    for transition in result.trajectory().transitions() {
        println!(
            "{} -> {} at {} ({}, {:.2} m/s)",
            transition.from.label(),
            transition.to.label(),
            format_time(transition.time),
            format_altitude(transition.altitude),
            -transition.velocity
        );
    }
    match &result {
        TrajectoryResult::Landed { summary, .. } => print!("{}", summary),
        TrajectoryResult::TimeLimitExceeded { warning, .. } => println!("Warning: {}", warning),
    }

    if let Some(path) = csv_path {
        save_trajectory_csv(result.trajectory(), path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    if let Some(path) = summary_path {
        let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        write_result_json(&result, file)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if show_drift || drift_path.is_some() {
        let profiles = drift_profiles(result.trajectory(), &default_wind_speeds(), DRIFT_SAMPLE_INTERVAL);
        if show_drift {
            println!("--- Landing Drift ---");
            for profile in &profiles {
                println!(
                    "Wind {:>4.1} m/s: {}",
                    profile.wind_speed,
                    format_altitude(profile.landing_distance)
                );
            }
        }
        if let Some(path) = drift_path {
            let file =
                File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
            write_drift_csv(&profiles, file)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
    }

    Ok(())
}
