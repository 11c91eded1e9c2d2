use earcutr::earcut;
use foundation::math::GeoPoint;

use crate::error::TessellationError;

/// Rings flattened for ear clipping: one vertex list, holes marked by the
/// index of their first vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatPolygon {
    pub vertices: Vec<GeoPoint>,
    pub hole_indices: Vec<usize>,
}

impl FlatPolygon {
    /// Normalize and flatten `rings` (outer boundary first, then holes).
    pub fn from_rings(rings: &[Vec<GeoPoint>]) -> Result<Self, TessellationError> {
        if rings.is_empty() {
            return Err(TessellationError::TooFewPoints { ring: 0, count: 0 });
        }

        let mut vertices = Vec::new();
        let mut hole_indices = Vec::new();
        for (ring_i, ring) in rings.iter().enumerate() {
            let ring = normalize_ring(ring, ring_i)?;
            if ring_i > 0 {
                hole_indices.push(vertices.len());
            }
            vertices.extend(ring);
        }

        Ok(Self {
            vertices,
            hole_indices,
        })
    }

    pub fn coords(&self) -> Vec<f64> {
        let mut coords = Vec::with_capacity(self.vertices.len() * 2);
        for v in &self.vertices {
            coords.push(v.lon_deg);
            coords.push(v.lat_deg);
        }
        coords
    }

    pub fn triangulate(&self) -> Result<Vec<[usize; 3]>, TessellationError> {
        triangulate(&self.coords(), &self.hole_indices)
    }
}

/// Ear-clip flat `[lon, lat, lon, lat, ...]` coordinates into index triples.
///
/// An empty result is an error: a valid simple polygon always yields at
/// least one triangle.
pub fn triangulate(
    coords: &[f64],
    hole_indices: &[usize],
) -> Result<Vec<[usize; 3]>, TessellationError> {
    let indices =
        earcut(coords, hole_indices, 2).map_err(|_| TessellationError::Triangulation {
            reason: "ear clipping rejected the input".to_string(),
        })?;

    if indices.is_empty() || indices.len() % 3 != 0 {
        return Err(TessellationError::Triangulation {
            reason: format!("ear clipping produced {} indices", indices.len()),
        });
    }

    Ok(indices
        .chunks_exact(3)
        .map(|tri| [tri[0], tri[1], tri[2]])
        .collect())
}

/// Drop the closing duplicate and repeated consecutive points, then reject
/// rings that cannot be triangulated.
pub fn normalize_ring(ring: &[GeoPoint], ring_i: usize) -> Result<Vec<GeoPoint>, TessellationError> {
    if let Some(index) = ring.iter().position(|p| !p.is_finite()) {
        return Err(TessellationError::NonFinite {
            ring: ring_i,
            index,
        });
    }

    let mut out: Vec<GeoPoint> = Vec::with_capacity(ring.len());
    for p in ring {
        if out.last() != Some(p) {
            out.push(*p);
        }
    }
    while out.len() >= 2 && out.first() == out.last() {
        out.pop();
    }

    if out.len() < 3 {
        return Err(TessellationError::TooFewPoints {
            ring: ring_i,
            count: out.len(),
        });
    }
    if signed_area(&out).abs() <= 1e-12 {
        return Err(TessellationError::ZeroArea { ring: ring_i });
    }

    Ok(out)
}

/// Shoelace area in square degrees; positive for counter-clockwise rings.
pub fn signed_area(ring: &[GeoPoint]) -> f64 {
    let n = ring.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        sum += a.lon_deg * b.lat_deg - b.lon_deg * a.lat_deg;
    }
    sum * 0.5
}

#[cfg(test)]
mod tests {
    use super::{FlatPolygon, normalize_ring, signed_area, triangulate};
    use crate::error::TessellationError;
    use foundation::math::GeoPoint;

    fn ring(points: &[(f64, f64)]) -> Vec<GeoPoint> {
        points.iter().map(|&(lon, lat)| GeoPoint::new(lon, lat)).collect()
    }

    #[test]
    fn square_gives_two_triangles() {
        let coords = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
        let tris = triangulate(&coords, &[]).expect("triangulate");
        assert_eq!(tris.len(), 2);
        for tri in tris {
            assert!(tri.iter().all(|&i| i < 4));
        }
    }

    #[test]
    fn closing_and_repeated_points_are_removed() {
        let r = ring(&[(0.0, 0.0), (0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 0.0)]);
        let n = normalize_ring(&r, 0).expect("normalize");
        assert_eq!(n, ring(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0)]));
    }

    #[test]
    fn degenerate_rings_are_errors() {
        let two = ring(&[(0.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        assert_eq!(
            normalize_ring(&two, 0),
            Err(TessellationError::TooFewPoints { ring: 0, count: 2 })
        );

        let line = ring(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        assert_eq!(
            normalize_ring(&line, 3),
            Err(TessellationError::ZeroArea { ring: 3 })
        );

        let nan = ring(&[(0.0, 0.0), (f64::NAN, 1.0), (2.0, 0.0)]);
        assert_eq!(
            normalize_ring(&nan, 1),
            Err(TessellationError::NonFinite { ring: 1, index: 1 })
        );
    }

    #[test]
    fn holes_are_cut_out() {
        let outer = ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]);
        let hole = ring(&[(4.0, 4.0), (4.0, 6.0), (6.0, 6.0), (6.0, 4.0), (4.0, 4.0)]);
        let flat = FlatPolygon::from_rings(&[outer, hole]).expect("flatten");
        assert_eq!(flat.vertices.len(), 8);
        assert_eq!(flat.hole_indices, vec![4]);

        let tris = flat.triangulate().expect("triangulate");
        let area: f64 = tris
            .iter()
            .map(|t| {
                signed_area(&[flat.vertices[t[0]], flat.vertices[t[1]], flat.vertices[t[2]]]).abs()
            })
            .sum();
        assert!((area - 96.0).abs() < 1e-9, "area {area}");
    }

    #[test]
    fn signed_area_sign_follows_winding() {
        let ccw = ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        assert_eq!(signed_area(&ccw), 1.0);
        let cw: Vec<GeoPoint> = ccw.iter().rev().copied().collect();
        assert_eq!(signed_area(&cw), -1.0);
    }
}
