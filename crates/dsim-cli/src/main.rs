//! Headless driver: builds a world from flags, infects patient zero and
//! runs a fixed number of ticks, writing the record log to stdout or a file.

mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use dsim_core::{NodeId, WorldConfig};
use dsim_world::{CsvSink, World};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Agent-based epidemic simulator
#[derive(Parser, Debug)]
#[command(name = "dsim")]
#[command(about = "Run a seeded epidemic simulation and log node states", long_about = None)]
struct Args {
    /// JSON configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the record log to this file instead of stdout
    #[arg(long)]
    file: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(short, long, default_value = "100")]
    ticks: u64,

    /// Node initially infected
    #[arg(long, default_value = "0")]
    patient_zero: u32,

    /// Random seed (default: seconds since the Unix epoch)
    #[arg(short, long)]
    seed: Option<u64>,

    #[arg(long)]
    node_count: Option<u32>,

    #[arg(long)]
    min_inf_time: Option<u32>,

    #[arg(long)]
    max_inf_time: Option<u32>,

    #[arg(long)]
    survival_rate: Option<f64>,

    /// Allow recovered nodes to be infected again
    #[arg(long)]
    reinfect: bool,

    #[arg(long)]
    min_max_travel: Option<f64>,

    #[arg(long)]
    max_max_travel: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    min_pos_x: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    min_pos_y: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    max_pos_x: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    max_pos_y: Option<f64>,

    #[arg(long)]
    max_speed: Option<f64>,

    #[arg(long)]
    contact_radius: Option<f64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Defaults, then the config file, then individual flags
    fn world_config(&self) -> Result<WorldConfig> {
        let mut config = match &self.config {
            Some(path) => WorldConfig::from_json_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => WorldConfig {
                seed: clock_seed(),
                ..Default::default()
            },
        };

        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(v) = self.node_count {
            config.num_nodes = v;
        }
        if let Some(v) = self.min_inf_time {
            config.min_inf_time = v;
        }
        if let Some(v) = self.max_inf_time {
            config.max_inf_time = v;
        }
        if let Some(v) = self.survival_rate {
            config.survival_rate = v;
        }
        if self.reinfect {
            config.reinfect = true;
        }
        if let Some(v) = self.min_max_travel {
            config.min_max_travel = v;
        }
        if let Some(v) = self.max_max_travel {
            config.max_max_travel = v;
        }
        if let Some(v) = self.min_pos_x {
            config.min_pos.x = v;
        }
        if let Some(v) = self.min_pos_y {
            config.min_pos.y = v;
        }
        if let Some(v) = self.max_pos_x {
            config.max_pos.x = v;
        }
        if let Some(v) = self.max_pos_y {
            config.max_pos.y = v;
        }
        if let Some(v) = self.max_speed {
            config.max_speed = v;
        }
        if let Some(v) = self.contact_radius {
            config.contact_radius = v;
        }

        Ok(config)
    }

    fn output(&self) -> Result<Box<dyn Write>> {
        match &self.file {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                Ok(Box::new(BufWriter::new(file)))
            }
            None => Ok(Box::new(io::stdout().lock())),
        }
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn main() -> Result<()> {
    let args = Args::parse();
    telemetry::init_telemetry(args.verbose)?;

    let config = args.world_config()?;
    info!(seed = config.seed, num_nodes = config.num_nodes, "Starting dSim");

    let sink = CsvSink::new(args.output()?);
    let mut world = World::new(config, sink).context("failed to build world")?;
    world
        .infect(NodeId(args.patient_zero))
        .context("failed to infect patient zero")?;

    let report_every = (args.ticks / 10).max(1);
    for _ in 0..args.ticks {
        world.advance_tick()?;

        if world.tick() % report_every == 0 {
            let stats = world.stats();
            info!(
                tick = stats.tick,
                infected = stats.infected,
                susceptible = stats.susceptible,
                "Progress"
            );
        }
    }

    world.flush()?;
    let stats = world.stats();
    info!(
        ticks = stats.tick,
        total = stats.total,
        infected = stats.infected,
        infected_fraction = format!("{:.2}%", stats.infected_fraction() * 100.0),
        "Run complete"
    );

    world.into_sink().into_inner()?.flush()?;
    Ok(())
}
