//! Multi-waypoint route following in orientation space.
//!
//! Each waypoint is stored as the rotation that carries a fixed reference
//! axis onto the waypoint's direction from the sphere center. Interpolating
//! those rotations with slerp and applying the result to the axis keeps the
//! vessel exactly on the sphere, even halfway along a long leg.

use foundation::math::{GeoPoint, Quat, Vec3};

use crate::advance_progress;

/// Axis every waypoint rotation starts from.
pub const ROUTE_AXIS: Vec3 = Vec3::Y;

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    waypoints: Vec<GeoPoint>,
    rotations: Vec<Quat>,
    progress: f64,
}

impl Route {
    /// Build a route; fewer than 2 waypoints is not a route.
    pub fn new(waypoints: Vec<GeoPoint>) -> Option<Self> {
        if waypoints.len() < 2 {
            return None;
        }
        let rotations = waypoints
            .iter()
            .map(|g| Quat::from_unit_vectors(ROUTE_AXIS, g.to_sphere(1.0)))
            .collect();
        Some(Self {
            waypoints,
            rotations,
            progress: 0.0,
        })
    }

    pub fn waypoints(&self) -> &[GeoPoint] {
        &self.waypoints
    }

    /// Route progress in `[0, 1]` across all legs.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn set_progress(&mut self, progress: f64) {
        self.progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    pub fn is_finished(&self) -> bool {
        self.progress >= 1.0
    }

    pub fn advance(&mut self, delta: f64) {
        if delta > 0.0 {
            self.progress = advance_progress(self.progress, delta);
        }
    }

    /// Leg index and local parameter for a route progress value.
    pub fn segment(&self, progress: f64) -> (usize, f64) {
        let legs = self.waypoints.len() - 1;
        let scaled = progress.clamp(0.0, 1.0) * legs as f64;
        let index = (scaled.floor() as usize).min(legs - 1);
        (index, scaled - index as f64)
    }

    /// Point on the sphere of `radius` at the given route progress.
    pub fn position_at(&self, progress: f64, radius: f64) -> Vec3 {
        let (index, t) = self.segment(progress);
        let q = self.rotations[index].slerp(self.rotations[index + 1], t);
        q.rotate(ROUTE_AXIS) * radius
    }

    pub fn position(&self, radius: f64) -> Vec3 {
        self.position_at(self.progress, radius)
    }

    /// Chord direction of the current leg, used to orient the vessel.
    pub fn leg_direction(&self) -> Vec3 {
        let (index, _) = self.segment(self.progress);
        self.waypoints[index + 1].to_sphere(1.0) - self.waypoints[index].to_sphere(1.0)
    }
}
