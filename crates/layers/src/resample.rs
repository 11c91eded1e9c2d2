//! Edge densification in lon/lat space.
//!
//! Long edges are split before triangulation so no flat triangle spans more
//! than `max_step_deg` along its boundary. That keeps the per-triangle
//! subdivision level low and uniform across a country outline.

use foundation::math::GeoPoint;

/// Upper bound on the segments one edge is split into.
pub const MAX_EDGE_STEPS: usize = 4096;

/// Densify every edge of `ring` so consecutive points differ by at most
/// `max_step_deg` in both longitude and latitude.
///
/// Each edge is split into `max(2, ceil(delta / max_step_deg))` steps, where
/// `delta` is the larger of `|Δlon|` and `|Δlat|`. Shared joints between
/// edges are emitted once. Input vertices are reproduced exactly, so a closed
/// ring stays closed.
///
/// Rings with fewer than 2 points, and non-positive steps, are returned
/// unchanged.
pub fn resample(ring: &[GeoPoint], max_step_deg: f64) -> Vec<GeoPoint> {
    if ring.len() < 2 || !max_step_deg.is_finite() || max_step_deg <= 0.0 {
        return ring.to_vec();
    }

    let mut out = Vec::with_capacity(ring.len() * 2);
    out.push(ring[0]);

    for pair in ring.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let steps = edge_steps(a, b, max_step_deg);
        for j in 1..=steps {
            if j == steps {
                out.push(b);
            } else {
                let t = j as f64 / steps as f64;
                out.push(lerp_geo(a, b, t));
            }
        }
    }

    out
}

/// Number of segments an edge is split into, in `2..=MAX_EDGE_STEPS`.
pub fn edge_steps(a: GeoPoint, b: GeoPoint, max_step_deg: f64) -> usize {
    let delta = (b.lon_deg - a.lon_deg)
        .abs()
        .max((b.lat_deg - a.lat_deg).abs());
    let steps = (delta / max_step_deg).ceil();
    if steps.is_nan() || steps <= 2.0 {
        2
    } else if steps >= MAX_EDGE_STEPS as f64 {
        MAX_EDGE_STEPS
    } else {
        steps as usize
    }
}

fn lerp_geo(a: GeoPoint, b: GeoPoint, t: f64) -> GeoPoint {
    GeoPoint::new(
        a.lon_deg * (1.0 - t) + b.lon_deg * t,
        a.lat_deg * (1.0 - t) + b.lat_deg * t,
    )
}
