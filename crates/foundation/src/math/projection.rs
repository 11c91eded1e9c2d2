//! Longitude/latitude to sphere projection used by every mesh and marker.
//!
//! The axis convention is fixed: +Y points at the north pole and the prime
//! meridian on the equator maps to +X. Consumers that re-derive positions
//! (picking, labels, camera framing) must use the same formula.

use serde::{Deserialize, Serialize};

use super::Vec3;

/// Geographic coordinate in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon_deg: f64,
    pub lat_deg: f64,
}

impl GeoPoint {
    pub const fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self { lon_deg, lat_deg }
    }

    pub fn is_finite(self) -> bool {
        self.lon_deg.is_finite() && self.lat_deg.is_finite()
    }

    pub fn to_sphere(self, radius: f64) -> Vec3 {
        project(self.lat_deg, self.lon_deg, radius)
    }
}

/// Project a latitude/longitude pair onto a sphere of the given radius.
///
/// Inputs are used as given: latitudes outside ±90 and unwrapped longitudes
/// are not validated.
pub fn project(lat_deg: f64, lon_deg: f64, radius: f64) -> Vec3 {
    let phi = (90.0 - lat_deg).to_radians();
    let theta = (lon_deg + 180.0).to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();
    let (sin_theta, cos_theta) = theta.sin_cos();

    Vec3::new(
        -radius * sin_phi * cos_theta,
        radius * cos_phi,
        radius * sin_phi * sin_theta,
    )
}

/// Inverse of [`project`]. Longitude is wrapped into `[-180, 180)`.
///
/// Longitude is undefined on the polar axis; 0 is reported there.
pub fn unproject(p: Vec3) -> GeoPoint {
    let r = p.length();
    if r <= 0.0 {
        return GeoPoint::new(0.0, 0.0);
    }
    let phi = (p.y / r).clamp(-1.0, 1.0).acos();
    let lat = 90.0 - phi.to_degrees();

    if p.x.abs() < 1e-15 && p.z.abs() < 1e-15 {
        return GeoPoint::new(0.0, lat);
    }
    let theta = p.z.atan2(-p.x);
    let mut lon = theta.to_degrees() - 180.0;
    if lon < -180.0 {
        lon += 360.0;
    }
    GeoPoint::new(lon, lat)
}

#[cfg(test)]
mod tests {
    use super::{GeoPoint, project, unproject};
    use crate::math::Vec3;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn north_pole_is_plus_y() {
        let p = project(90.0, 0.0, 2.0);
        assert_close(p.x, 0.0, 1e-12);
        assert_close(p.y, 2.0, 1e-12);
        assert_close(p.z, 0.0, 1e-12);
    }

    #[test]
    fn equator_prime_meridian_is_plus_x() {
        let p = project(0.0, 0.0, 1.0);
        assert_close(p.x, 1.0, 1e-12);
        assert_close(p.y, 0.0, 1e-12);
        assert_close(p.z, 0.0, 1e-12);

        // 90°E lands on -Z with this convention.
        let e = project(0.0, 90.0, 1.0);
        assert_close(e.z, -1.0, 1e-12);
    }

    #[test]
    fn projected_points_lie_on_the_sphere() {
        for radius in [0.5, 1.0, 2.0, 6371.0] {
            let mut lat = -90.0;
            while lat <= 90.0 {
                let mut lon = -180.0;
                while lon <= 180.0 {
                    let p = project(lat, lon, radius);
                    assert_close(p.length(), radius, radius * 1e-12);
                    lon += 17.5;
                }
                lat += 7.5;
            }
        }
    }

    #[test]
    fn unproject_inverts_project() {
        for (lon, lat) in [(0.0, 0.0), (-73.5, 40.7), (139.7, 35.7), (-179.0, -45.0)] {
            let g = unproject(project(lat, lon, 3.0));
            assert_close(g.lon_deg, lon, 1e-9);
            assert_close(g.lat_deg, lat, 1e-9);
        }
        assert_eq!(unproject(Vec3::ZERO), GeoPoint::new(0.0, 0.0));
    }

    #[test]
    fn geo_point_projection_matches_free_function() {
        let g = GeoPoint::new(12.5, -8.25);
        assert_eq!(g.to_sphere(1.5), project(-8.25, 12.5, 1.5));
    }
}
