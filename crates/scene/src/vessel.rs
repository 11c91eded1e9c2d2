//! Per-vessel kinematic state.
//!
//! Position reports arrive every few seconds to minutes. Between reports a
//! vessel glides from where it was drawn last (`previous_position`) toward
//! the newest report (`target_position`) at a rate derived from its reported
//! speed. When a route is attached, the route drives the position instead.

use foundation::math::{GeoPoint, Quat, Vec3, project};
use foundation::time::Time;
use serde::{Deserialize, Serialize};

use crate::advance_progress;
use crate::route::Route;
use crate::transform::Transform;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VesselId(pub String);

impl VesselId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VesselId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VesselId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One live position report.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselReport {
    pub lat_deg: f64,
    pub lon_deg: f64,
    /// Degrees, 0 = north, clockwise.
    pub heading_deg: f64,
    /// Knots, never negative.
    pub speed_knots: f64,
    pub timestamp: Option<Time>,
}

impl VesselReport {
    pub fn new(lat_deg: f64, lon_deg: f64, heading_deg: f64, speed_knots: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            heading_deg,
            speed_knots: speed_knots.max(0.0),
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: Time) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn geo(&self) -> GeoPoint {
        GeoPoint::new(self.lon_deg, self.lat_deg)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinematicsConfig {
    /// Sphere radius vessel markers are placed on.
    pub radius: f64,
    /// Sphere units per second for one knot. Calibrated for the display,
    /// not geodetically exact.
    pub speed_scale: f64,
    /// Floor for the speed rate so stationary reports never divide by zero.
    pub min_speed_rate: f64,
    /// Chord distances at or below this are report jitter, not motion.
    pub noise_threshold: f64,
    /// Orientation follows motion only past this much progress.
    pub min_orientation_progress: f64,
    /// Route progress gained per second while a route is attached.
    pub route_rate: f64,
}

impl Default for KinematicsConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            speed_scale: 1e-4,
            min_speed_rate: 1e-6,
            noise_threshold: 1e-3,
            min_orientation_progress: 0.01,
            route_rate: 0.02,
        }
    }
}

impl KinematicsConfig {
    pub fn speed_rate(&self, speed_knots: f64) -> f64 {
        (speed_knots.max(0.0) * self.speed_scale).max(self.min_speed_rate)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vessel {
    id: VesselId,
    report: VesselReport,
    previous_position: Vec3,
    target_position: Vec3,
    current_position: Vec3,
    orientation: Quat,
    interpolation_progress: f64,
    is_moving: bool,
    route: Option<Route>,
}

impl Vessel {
    /// A vessel at rest at its first report, facing its reported heading.
    pub fn new(id: VesselId, report: VesselReport, config: &KinematicsConfig) -> Self {
        let position = project(report.lat_deg, report.lon_deg, config.radius);
        let orientation = heading_direction(report.lat_deg, report.lon_deg, report.heading_deg)
            .and_then(|dir| tangent_orientation(position, dir))
            .unwrap_or(Quat::IDENTITY);
        Self {
            id,
            report,
            previous_position: position,
            target_position: position,
            current_position: position,
            orientation,
            interpolation_progress: 1.0,
            is_moving: false,
            route: None,
        }
    }

    pub fn id(&self) -> &VesselId {
        &self.id
    }

    pub fn report(&self) -> &VesselReport {
        &self.report
    }

    pub fn previous_position(&self) -> Vec3 {
        self.previous_position
    }

    pub fn target_position(&self) -> Vec3 {
        self.target_position
    }

    pub fn current_position(&self) -> Vec3 {
        self.current_position
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn interpolation_progress(&self) -> f64 {
        self.interpolation_progress
    }

    pub fn is_moving(&self) -> bool {
        self.is_moving
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn route_progress(&self) -> Option<f64> {
        self.route.as_ref().map(Route::progress)
    }

    pub fn transform(&self) -> Transform {
        Transform::new(self.current_position, self.orientation)
    }

    /// Chord length between the interpolation endpoints.
    pub fn chord_distance(&self) -> f64 {
        self.target_position.distance(self.previous_position)
    }

    /// Seconds the current hop takes at the reported speed.
    pub fn time_to_target(&self, config: &KinematicsConfig) -> f64 {
        self.chord_distance() / config.speed_rate(self.report.speed_knots)
    }

    /// Apply a new report. Returns `true` when it moved the target, which
    /// restarts interpolation from wherever the vessel is drawn now.
    ///
    /// A report that does not move the target only refreshes speed, heading
    /// and timestamp.
    pub fn apply_report(&mut self, report: VesselReport, config: &KinematicsConfig) -> bool {
        let target = project(report.lat_deg, report.lon_deg, config.radius);
        self.report = report;
        if target == self.target_position {
            self.is_moving = self.motion_detected(config);
            return false;
        }

        self.previous_position = self.current_position;
        self.target_position = target;
        self.interpolation_progress = 0.0;
        self.is_moving = self.motion_detected(config);
        true
    }

    /// Advance by `dt` seconds. Non-positive `dt` leaves the state untouched.
    pub fn tick(&mut self, dt: f64, config: &KinematicsConfig) {
        if dt.is_nan() || dt <= 0.0 {
            return;
        }

        if self.interpolation_progress < 1.0 {
            let step = dt / self.time_to_target(config);
            self.interpolation_progress = advance_progress(self.interpolation_progress, step);
        }
        self.is_moving = self.motion_detected(config);

        if let Some(route) = self.route.as_mut() {
            route.advance(dt * config.route_rate);
            self.current_position = route.position(config.radius);
            if !route.is_finished() {
                let dir = route.leg_direction();
                if let Some(q) = tangent_orientation(self.current_position, dir) {
                    self.orientation = q;
                }
            }
            return;
        }

        if self.interpolation_progress >= 1.0 {
            self.current_position = self.target_position;
        } else {
            self.current_position = self
                .previous_position
                .lerp(self.target_position, self.interpolation_progress);
        }

        if self.is_moving && self.interpolation_progress > config.min_orientation_progress {
            let dir = self.target_position - self.previous_position;
            if let Some(q) = tangent_orientation(self.current_position, dir) {
                self.orientation = q;
            }
        }
    }

    /// Attach a route; fewer than 2 waypoints clears it instead.
    pub fn set_route(&mut self, waypoints: Vec<GeoPoint>, config: &KinematicsConfig) -> bool {
        self.route = Route::new(waypoints);
        if let Some(route) = &self.route {
            self.current_position = route.position(config.radius);
        }
        self.route.is_some()
    }

    /// Drop the route; the vessel resumes report-driven motion.
    pub fn clear_route(&mut self) {
        if self.route.take().is_some() {
            self.current_position = if self.interpolation_progress >= 1.0 {
                self.target_position
            } else {
                self.previous_position
                    .lerp(self.target_position, self.interpolation_progress)
            };
        }
    }

    fn motion_detected(&self, config: &KinematicsConfig) -> bool {
        self.interpolation_progress < 1.0
            && self.report.speed_knots > 0.0
            && self.chord_distance() > config.noise_threshold
    }
}

/// Rotation whose local axes are (right, up, forward) in the tangent frame at
/// `position`, with forward along `direction` projected onto the tangent
/// plane.
///
/// Returns `None` when `direction` is (nearly) zero or radial.
pub fn tangent_orientation(position: Vec3, direction: Vec3) -> Option<Quat> {
    let up = position.try_normalize()?;
    let dir = direction.try_normalize()?;
    let right = up.cross(dir).try_normalize()?;
    let forward = right.cross(up);
    Some(Quat::from_basis(right, up, forward))
}

/// Tangent direction for a compass heading (0 = north, clockwise) at the
/// given coordinate.
pub fn heading_direction(lat_deg: f64, lon_deg: f64, heading_deg: f64) -> Option<Vec3> {
    if !heading_deg.is_finite() {
        return None;
    }
    let up = project(lat_deg, lon_deg, 1.0);
    let theta = (lon_deg + 180.0).to_radians();
    let east = Vec3::new(theta.sin(), 0.0, theta.cos());
    let north = up.cross(east);
    let (sin_h, cos_h) = heading_deg.to_radians().sin_cos();
    (north * cos_h + east * sin_h).try_normalize()
}
