//! Curvature-following polygon meshes on a sphere.
//!
//! Polygons are triangulated in flat lon/lat space, then every flat triangle
//! is projected and resampled on a barycentric grid whose samples are pushed
//! back out to the sphere. Large triangles therefore bulge with the globe
//! instead of cutting through it as chords.

use foundation::bounds::Aabb3;
use foundation::math::{GeoPoint, Vec3, project};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::TessellationError;
use crate::resample::resample;
use crate::triangulate::FlatPolygon;

/// Chord-length thresholds (in sphere radii) and the subdivision level used
/// for triangles whose longest chord exceeds them. Checked in order.
pub const SUBDIVISION_STEPS: [(f64, u32); 5] = [(0.5, 8), (0.3, 6), (0.2, 4), (0.1, 3), (0.05, 2)];

/// Highest subdivision level; one flat triangle never becomes more than
/// `MAX_SUBDIVISIONS²` triangles.
pub const MAX_SUBDIVISIONS: u32 = 64;

/// Flat triangle list; every vertex lies on a sphere of `radius`.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereMesh {
    pub radius: f64,
    pub triangles: Vec<[Vec3; 3]>,
}

impl SphereMesh {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            triangles: Vec::new(),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn vertices(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.triangles.iter().flat_map(|t| t.iter().copied())
    }

    /// Per-vertex normals: the outward radial direction at each vertex.
    pub fn normals(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices().map(Vec3::normalize_or_zero)
    }

    /// Interleaved-free `[x, y, z, x, y, z, ...]` positions for upload.
    pub fn positions_f32(&self) -> Vec<f32> {
        self.vertices().flat_map(|v| v.to_f32()).collect()
    }

    pub fn normals_f32(&self) -> Vec<f32> {
        self.normals().flat_map(|v| v.to_f32()).collect()
    }

    pub fn bounds(&self) -> Option<Aabb3> {
        Aabb3::from_points(self.vertices())
    }

    pub fn append(&mut self, other: SphereMesh) {
        self.triangles.extend(other.triangles);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TessellationConfig {
    /// Sphere radius the mesh is built on.
    pub radius: f64,
    /// Lower bound for the per-triangle subdivision level, at most
    /// [`MAX_SUBDIVISIONS`].
    pub min_subdivisions: u32,
    /// Densify ring edges to this many degrees before triangulating.
    pub max_step_deg: Option<f64>,
}

impl Default for TessellationConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            min_subdivisions: 1,
            max_step_deg: Some(2.0),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Tessellator {
    pub config: TessellationConfig,
}

impl Tessellator {
    pub fn new(config: TessellationConfig) -> Self {
        Self { config }
    }

    /// Tessellate one polygon: `rings[0]` is the outer boundary, the rest are
    /// holes.
    pub fn tessellate_polygon(
        &self,
        rings: &[Vec<GeoPoint>],
    ) -> Result<SphereMesh, TessellationError> {
        let rings: Vec<Vec<GeoPoint>> = match self.config.max_step_deg {
            Some(step) => rings
                .iter()
                .map(|ring| resample(&close_ring(ring), step))
                .collect(),
            None => rings.to_vec(),
        };
        let flat = FlatPolygon::from_rings(&rings)?;
        tessellate_flat(&flat, self.config.radius, self.config.min_subdivisions)
    }
}

/// Tessellate a single ring without resampling.
pub fn tessellate(
    ring: &[GeoPoint],
    radius: f64,
    min_subdivisions: u32,
) -> Result<SphereMesh, TessellationError> {
    let flat = FlatPolygon::from_rings(&[ring.to_vec()])?;
    tessellate_flat(&flat, radius, min_subdivisions)
}

fn tessellate_flat(
    flat: &FlatPolygon,
    radius: f64,
    min_subdivisions: u32,
) -> Result<SphereMesh, TessellationError> {
    let triangles = flat.triangulate()?;
    let projected: Vec<Vec3> = flat.vertices.iter().map(|g| g.to_sphere(radius)).collect();

    let mut mesh = SphereMesh::new(radius);
    for [i0, i1, i2] in triangles {
        let (a, b, c) = outward(projected[i0], projected[i1], projected[i2]);
        let chord = longest_chord(a, b, c) / radius.abs().max(f64::MIN_POSITIVE);
        let level = subdivision_level(chord).max(min_subdivisions);
        subdivide(a, b, c, level, radius, &mut mesh.triangles);
    }

    trace!(
        vertices = flat.vertices.len(),
        triangles = mesh.triangle_count(),
        "tessellated polygon"
    );
    Ok(mesh)
}

/// Subdivision level for a triangle whose longest edge has chord length
/// `chord`, measured in sphere radii.
pub fn subdivision_level(chord: f64) -> u32 {
    for (threshold, level) in SUBDIVISION_STEPS {
        if chord > threshold {
            return level;
        }
    }
    1
}

pub fn longest_chord(a: Vec3, b: Vec3, c: Vec3) -> f64 {
    a.distance(b).max(b.distance(c)).max(c.distance(a))
}

/// Resample triangle `abc` on a barycentric grid with `n` segments per edge,
/// pushing `n²` triangles into `out`. `n` is clamped to
/// `1..=MAX_SUBDIVISIONS`.
///
/// Corners are emitted as given; every other sample is re-normalized onto the
/// sphere of `radius`.
pub fn subdivide(a: Vec3, b: Vec3, c: Vec3, n: u32, radius: f64, out: &mut Vec<[Vec3; 3]>) {
    let n = n.clamp(1, MAX_SUBDIVISIONS) as usize;
    if n == 1 {
        out.push([a, b, c]);
        return;
    }

    // rows[i][j]: weight i/n on b, j/n on c, the rest on a.
    let mut rows: Vec<Vec<Vec3>> = Vec::with_capacity(n + 1);
    for i in 0..=n {
        let mut row = Vec::with_capacity(n + 1 - i);
        for j in 0..=(n - i) {
            row.push(grid_point(a, b, c, i, j, n, radius));
        }
        rows.push(row);
    }

    out.reserve(n * n);
    for i in 0..n {
        for j in 0..(n - i) {
            out.push([rows[i][j], rows[i + 1][j], rows[i][j + 1]]);
            if j + 1 < n - i {
                out.push([rows[i + 1][j], rows[i + 1][j + 1], rows[i][j + 1]]);
            }
        }
    }
}

fn grid_point(a: Vec3, b: Vec3, c: Vec3, i: usize, j: usize, n: usize, radius: f64) -> Vec3 {
    match (i, j) {
        (0, 0) => return a,
        (i, 0) if i == n => return b,
        (0, j) if j == n => return c,
        _ => {}
    }
    let u = i as f64 / n as f64;
    let v = j as f64 / n as f64;
    let blend = a * (1.0 - u - v) + b * u + c * v;
    match blend.try_normalize() {
        Some(dir) => dir * radius,
        None => blend,
    }
}

/// Reorder so the face normal points away from the sphere center.
fn outward(a: Vec3, b: Vec3, c: Vec3) -> (Vec3, Vec3, Vec3) {
    let normal = (b - a).cross(c - a);
    let centroid = a + b + c;
    if normal.dot(centroid) < 0.0 {
        (a, c, b)
    } else {
        (a, b, c)
    }
}

/// Close `ring` if its last point differs from its first.
pub fn close_ring(ring: &[GeoPoint]) -> Vec<GeoPoint> {
    let mut out = ring.to_vec();
    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            out.push(*first);
        }
    }
    out
}

/// Project a ring's vertices without tessellating, e.g. for outlines.
pub fn project_ring(ring: &[GeoPoint], radius: f64) -> Vec<Vec3> {
    ring.iter()
        .map(|g| project(g.lat_deg, g.lon_deg, radius))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn unit_square() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(1.0, 0.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(0.0, 1.0),
        ]
    }

    fn large_ring() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(-20.0, -10.0),
            GeoPoint::new(25.0, -15.0),
            GeoPoint::new(30.0, 20.0),
            GeoPoint::new(0.0, 35.0),
            GeoPoint::new(-25.0, 15.0),
            GeoPoint::new(-20.0, -10.0),
        ]
    }

    #[test]
    fn unit_square_at_radius_two() {
        let ring = unit_square();
        let mesh = tessellate(&ring, 2.0, 1).expect("tessellate");
        assert_eq!(mesh.triangle_count(), 2);

        let verts: Vec<Vec3> = mesh.vertices().collect();
        for g in &ring {
            let p = g.to_sphere(2.0);
            assert!(
                verts.iter().any(|v| v.distance(p) < 1e-12),
                "missing boundary vertex {g:?}"
            );
        }
    }

    #[test]
    fn every_vertex_is_on_the_sphere() {
        for radius in [1.0, 2.0, 100.0] {
            for min_sub in [1, 3, 5] {
                let mesh = tessellate(&large_ring(), radius, min_sub).expect("tessellate");
                assert!(!mesh.is_empty());
                for v in mesh.vertices() {
                    assert_close(v.length(), radius, radius * 1e-12);
                }
            }
        }
    }

    #[test]
    fn boundary_vertices_survive_higher_subdivision() {
        let ring = large_ring();
        for min_sub in [1, 2, 4, 8] {
            let mesh = tessellate(&ring, 1.0, min_sub).expect("tessellate");
            let verts: Vec<Vec3> = mesh.vertices().collect();
            for g in &ring {
                let p = g.to_sphere(1.0);
                assert!(verts.iter().any(|v| *v == p), "boundary vertex moved at {min_sub}");
            }
        }
    }

    #[test]
    fn higher_subdivision_never_reduces_triangle_count() {
        let ring = large_ring();
        let mut previous = 0;
        for min_sub in 1..=6 {
            let count = tessellate(&ring, 1.0, min_sub)
                .expect("tessellate")
                .triangle_count();
            assert!(count >= previous);
            previous = count;
        }
    }

    #[test]
    fn subdivision_emits_n_squared_triangles() {
        let a = GeoPoint::new(0.0, 0.0).to_sphere(1.0);
        let b = GeoPoint::new(10.0, 0.0).to_sphere(1.0);
        let c = GeoPoint::new(0.0, 10.0).to_sphere(1.0);
        for n in 1..=8 {
            let mut out = Vec::new();
            subdivide(a, b, c, n, 1.0, &mut out);
            assert_eq!(out.len(), (n * n) as usize);
        }
    }

    #[test]
    fn subdivision_level_is_capped() {
        let a = GeoPoint::new(0.0, 0.0).to_sphere(1.0);
        let b = GeoPoint::new(1.0, 0.0).to_sphere(1.0);
        let c = GeoPoint::new(0.0, 1.0).to_sphere(1.0);
        let mut out = Vec::new();
        subdivide(a, b, c, 4_000_000_000, 1.0, &mut out);
        assert_eq!(out.len(), (MAX_SUBDIVISIONS * MAX_SUBDIVISIONS) as usize);

        let mesh = tessellate(&unit_square(), 1.0, u32::MAX).expect("tessellate");
        assert_eq!(
            mesh.triangle_count(),
            2 * (MAX_SUBDIVISIONS * MAX_SUBDIVISIONS) as usize
        );
    }

    #[test]
    fn subdivision_follows_angular_size_not_radius() {
        let unit = tessellate(&large_ring(), 1.0, 1).expect("tessellate");
        let earth = tessellate(&large_ring(), 6371.0, 1).expect("tessellate");
        assert_eq!(unit.triangle_count(), earth.triangle_count());

        let square = tessellate(&unit_square(), 100.0, 1).expect("tessellate");
        assert_eq!(square.triangle_count(), 2);
    }

    #[test]
    fn subdivided_midpoints_bulge_outwards() {
        let a = GeoPoint::new(0.0, 0.0).to_sphere(1.0);
        let b = GeoPoint::new(60.0, 0.0).to_sphere(1.0);
        let c = GeoPoint::new(0.0, 60.0).to_sphere(1.0);
        let mut out = Vec::new();
        subdivide(a, b, c, 2, 1.0, &mut out);
        let chord_mid = (a + b) * 0.5;
        let curved_mid = out[0][1];
        assert!(chord_mid.length() < 0.9);
        assert_close(curved_mid.length(), 1.0, 1e-12);
    }

    #[test]
    fn subdivision_level_is_monotone_step_function() {
        assert_eq!(subdivision_level(0.01), 1);
        assert_eq!(subdivision_level(0.06), 2);
        assert_eq!(subdivision_level(0.15), 3);
        assert_eq!(subdivision_level(0.25), 4);
        assert_eq!(subdivision_level(0.4), 6);
        assert_eq!(subdivision_level(0.9), 8);
        let mut last = 0;
        for k in 0..200 {
            let level = subdivision_level(k as f64 * 0.005);
            assert!(level >= last);
            last = level;
        }
    }

    #[test]
    fn triangles_face_outwards() {
        let mut cw = large_ring();
        cw.reverse();
        for ring in [large_ring(), cw] {
            let mesh = tessellate(&ring, 1.0, 2).expect("tessellate");
            for [a, b, c] in &mesh.triangles {
                let normal = (*b - *a).cross(*c - *a);
                assert!(normal.dot(*a + *b + *c) > 0.0);
            }
        }
    }

    #[test]
    fn tessellator_resamples_and_closes_rings() {
        let tess = Tessellator::new(TessellationConfig {
            radius: 1.0,
            min_subdivisions: 1,
            max_step_deg: Some(0.25),
        });
        let mesh = tess.tessellate_polygon(&[unit_square()]).expect("tessellate");
        assert!(mesh.triangle_count() >= 2);

        let verts: Vec<Vec3> = mesh.vertices().collect();
        for g in unit_square() {
            let p = g.to_sphere(1.0);
            assert!(verts.iter().any(|v| *v == p), "corner {g:?} lost");
        }
        for v in mesh.normals() {
            assert_close(v.length(), 1.0, 1e-12);
        }
        assert_eq!(mesh.positions_f32().len(), mesh.triangle_count() * 9);
        assert!(mesh.bounds().is_some());
    }

    #[test]
    fn degenerate_ring_is_reported() {
        let ring = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0)];
        assert!(matches!(
            tessellate(&ring, 1.0, 1),
            Err(TessellationError::TooFewPoints { .. })
        ));
    }
}
