//! The `globe` subcommands as plain functions over parsed inputs. `main`
//! only does argument parsing, file IO and printing.

use formats::{PolygonCollection, RejectedFeature};
use foundation::math::{GeoPoint, Vec3};
use layers::{BordersLayer, TessellationConfig};
use runtime::FrameClock;
use scene::{CameraController, CameraFrame, Fleet, KinematicsConfig, VesselId, VesselReport};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSummary {
    pub label: String,
    pub name: Option<String>,
    pub polygons: usize,
    pub triangles: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureSummary {
    pub feature: String,
    pub polygon: usize,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshDump {
    pub label: String,
    /// xyz per vertex, 3 vertices per triangle.
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TessellateReport {
    pub radius: f64,
    pub triangles: usize,
    pub features: Vec<FeatureSummary>,
    pub failures: Vec<FailureSummary>,
    pub skipped_features: usize,
    pub rejected_features: Vec<RejectedFeature>,
    pub bounds: Option<[[f64; 3]; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meshes: Option<Vec<MeshDump>>,
}

pub fn tessellate(
    collection: &PolygonCollection,
    config: &TessellationConfig,
    dump: bool,
) -> TessellateReport {
    let snapshot = BordersLayer::new(config.clone()).extract(collection);

    let features = snapshot
        .features
        .iter()
        .map(|f| FeatureSummary {
            label: f.label.clone(),
            name: f.name.clone(),
            polygons: f.polygons,
            triangles: f.mesh.triangle_count(),
        })
        .collect();
    let failures = snapshot
        .failures
        .iter()
        .map(|f| FailureSummary {
            feature: f.feature.clone(),
            polygon: f.polygon,
            error: f.error.to_string(),
        })
        .collect();
    let meshes = dump.then(|| {
        snapshot
            .features
            .iter()
            .map(|f| MeshDump {
                label: f.label.clone(),
                positions: f.mesh.positions_f32(),
                normals: f.mesh.normals_f32(),
            })
            .collect()
    });

    TessellateReport {
        radius: config.radius,
        triangles: snapshot.triangle_count(),
        features,
        failures,
        skipped_features: collection.skipped,
        rejected_features: collection.rejected.clone(),
        bounds: snapshot.bounds().map(|b| [b.min, b.max]),
        meshes,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulateOptions {
    /// Seconds of simulated time between feed snapshots.
    pub interval_s: f64,
    /// Frame step of the simulated render loop.
    pub dt_s: f64,
    /// Longest step the frame clock passes through. Raised to `dt_s` when
    /// smaller, so every simulated frame advances by exactly `dt_s`.
    pub max_dt_s: f64,
    pub select: Option<VesselId>,
    pub route: Option<Vec<GeoPoint>>,
}

impl Default for SimulateOptions {
    fn default() -> Self {
        Self {
            interval_s: 10.0,
            dt_s: 1.0 / 60.0,
            max_dt_s: runtime::DEFAULT_MAX_DT_S,
            select: None,
            route: None,
        }
    }
}

/// One vessel's state at the end of a snapshot interval. Printed as one
/// NDJSON line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VesselRecord {
    pub snapshot: usize,
    pub frame: u64,
    pub time_s: f64,
    pub id: String,
    pub position: [f64; 3],
    pub orientation: [f64; 4],
    pub progress: f64,
    pub moving: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_progress: Option<f64>,
}

/// Replay feed snapshots through a fleet, `interval_s` of simulated frames
/// per snapshot.
pub fn simulate(
    snapshots: Vec<Vec<(VesselId, VesselReport)>>,
    options: &SimulateOptions,
    config: &KinematicsConfig,
) -> Result<Vec<VesselRecord>, String> {
    if !options.dt_s.is_finite() || options.dt_s <= 0.0 {
        return Err(format!("--dt must be positive, got {}", options.dt_s));
    }
    if !options.interval_s.is_finite() || options.interval_s < 0.0 {
        return Err(format!(
            "--interval must be non-negative, got {}",
            options.interval_s
        ));
    }
    let frames_per_snapshot = (options.interval_s / options.dt_s).round() as u64;

    let mut fleet = Fleet::new(config.clone());
    let mut clock = FrameClock::new(options.dt_s.max(options.max_dt_s));
    let mut host_s = 0.0;
    let mut frame = clock.tick(host_s);
    let mut records = Vec::new();

    for (snapshot, reports) in snapshots.into_iter().enumerate() {
        let summary = fleet.sync(reports);
        debug!(snapshot, ?summary, "applied feed snapshot");

        if snapshot == 0 {
            if let Some(id) = &options.select {
                if !fleet.select(id) {
                    return Err(format!("vessel {id} is not in the first snapshot"));
                }
                if let Some(route) = &options.route {
                    if !fleet.set_route(id, route.clone()) {
                        return Err("route needs at least 2 waypoints".to_string());
                    }
                }
            }
        }

        for _ in 0..frames_per_snapshot {
            host_s += options.dt_s;
            frame = clock.tick(host_s);
            fleet.tick(frame.dt_s);
        }

        for id in fleet.ids() {
            let Some(vessel) = fleet.get(id) else {
                continue;
            };
            let transform = vessel.transform();
            records.push(VesselRecord {
                snapshot,
                frame: frame.index,
                time_s: frame.time.seconds(),
                id: id.to_string(),
                position: transform.position.as_array(),
                orientation: transform.orientation.as_array(),
                progress: vessel.interpolation_progress(),
                moving: vessel.is_moving(),
                route_progress: vessel.route_progress(),
            });
        }
    }

    info!(
        vessels = fleet.len(),
        frames = frame.index,
        records = records.len(),
        "simulation finished"
    );
    Ok(records)
}

/// Fly the camera from `home` to frame vessel `id`, optionally flying back
/// afterwards. Returns every camera frame in order.
pub fn fly_to(
    fleet: &Fleet,
    id: &VesselId,
    camera: &mut CameraController,
    and_return: bool,
) -> Result<Vec<CameraFrame>, String> {
    let vessel = fleet
        .get(id)
        .ok_or_else(|| format!("unknown vessel {id}"))?;
    let target: Vec3 = vessel.current_position();
    if !camera.fly_to(target) {
        return Err(format!("vessel {id} has no usable position"));
    }

    let mut frames = Vec::new();
    drain(camera, &mut frames);
    if and_return && camera.return_home() {
        drain(camera, &mut frames);
    }
    Ok(frames)
}

fn drain(camera: &mut CameraController, frames: &mut Vec<CameraFrame>) {
    while let Some(frame) = camera.tick() {
        let done = frame.done;
        frames.push(frame);
        if done {
            break;
        }
    }
}
