use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use foundation::math::Vec3;
use scene::{CameraController, Fleet, VesselId, VesselReport};
use serde::Serialize;
use tools::GlobeConfig;
use tools::commands::{self, SimulateOptions};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "globe", about = "Globe tessellation and vessel motion tools")]
struct Cli {
    /// JSON config file; missing fields keep their defaults.
    #[arg(long, env = "GLOBE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Sphere radius for meshes, vessels and the camera. Vessel speed, the
    /// jitter threshold and the fly-to altitude scale with it.
    #[arg(long, env = "GLOBE_RADIUS", global = true)]
    radius: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Tessellate every polygon of a GeoJSON FeatureCollection.
    Tessellate {
        input: PathBuf,
        /// Lowest per-triangle subdivision level, at most 64.
        #[arg(long)]
        min_subdivisions: Option<u32>,
        /// Densify ring edges to this many degrees; 0 disables resampling.
        #[arg(long)]
        max_step_deg: Option<f64>,
        /// Include vertex and normal buffers in the output.
        #[arg(long)]
        dump: bool,
    },
    /// Replay vessel feed snapshots and print NDJSON transforms.
    Simulate {
        #[arg(required = true)]
        feeds: Vec<PathBuf>,
        /// Simulated seconds between snapshots.
        #[arg(long, default_value_t = 10.0)]
        interval: f64,
        /// Frame step in seconds.
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f64,
        /// Select this vessel after the first snapshot.
        #[arg(long)]
        select: Option<String>,
        /// Route feed for the selected vessel.
        #[arg(long, requires = "select")]
        route: Option<PathBuf>,
    },
    /// Fly the camera to a vessel and print every camera frame.
    FlyTo {
        feed: PathBuf,
        id: String,
        /// Progress per tick.
        #[arg(long)]
        step: Option<f64>,
        /// Fly back to the starting viewpoint afterwards.
        #[arg(long = "return")]
        and_return: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let cli = Cli::parse();
    let mut config = GlobeConfig::load(cli.config.as_deref()).map_err(|e| e.to_string())?;
    if let Some(radius) = cli.radius {
        config = config.with_radius(radius).map_err(|e| e.to_string())?;
    }

    match cli.command {
        Command::Tessellate {
            input,
            min_subdivisions,
            max_step_deg,
            dump,
        } => {
            if let Some(min) = min_subdivisions {
                config.tessellation.min_subdivisions = min;
            }
            if let Some(step) = max_step_deg {
                config.tessellation.max_step_deg = (step != 0.0).then_some(step);
            }
            config.validate().map_err(|e| e.to_string())?;
            let payload = read(&input)?;
            let collection =
                formats::PolygonCollection::from_geojson_str(&payload).map_err(|e| e.to_string())?;
            let report = commands::tessellate(&collection, &config.tessellation, dump);
            print_json(&report)
        }
        Command::Simulate {
            feeds,
            interval,
            dt,
            select,
            route,
        } => {
            let snapshots = feeds
                .iter()
                .map(|path| read_vessel_feed(path))
                .collect::<Result<Vec<_>, String>>()?;
            let route = match route {
                Some(path) => {
                    Some(formats::parse_route_feed(&read(&path)?).map_err(|e| e.to_string())?)
                }
                None => None,
            };
            let options = SimulateOptions {
                interval_s: interval,
                dt_s: dt,
                select: select.map(VesselId),
                route,
                ..SimulateOptions::default()
            };
            let records = commands::simulate(snapshots, &options, &config.kinematics)?;
            print_ndjson(&records)
        }
        Command::FlyTo {
            feed,
            id,
            step,
            and_return,
        } => {
            if let Some(step) = step {
                config.camera.step = step;
                config.validate().map_err(|e| e.to_string())?;
            }
            let camera_config = config.camera;
            let mut fleet = Fleet::new(config.kinematics.clone());
            fleet.sync(read_vessel_feed(&feed)?);

            let home = Vec3::new(0.0, 0.0, 3.0 * config.kinematics.radius);
            let mut camera = CameraController::new(camera_config, home, Vec3::ZERO);
            let frames = commands::fly_to(&fleet, &VesselId(id), &mut camera, and_return)?;
            print_ndjson(&frames)
        }
    }
}

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))
}

fn read_vessel_feed(path: &Path) -> Result<Vec<(VesselId, VesselReport)>, String> {
    formats::parse_vessel_feed(&read(path)?).map_err(|e| format!("{path:?}: {e}"))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).map_err(|e| e.to_string())?;
    writeln!(out).map_err(|e| e.to_string())
}

fn print_ndjson<T: Serialize>(rows: &[T]) -> Result<(), String> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for row in rows {
        serde_json::to_writer(&mut out, row).map_err(|e| e.to_string())?;
        writeln!(out).map_err(|e| e.to_string())?;
    }
    Ok(())
}
