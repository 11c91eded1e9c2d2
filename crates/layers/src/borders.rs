//! Country border fills: every polygon of a collection tessellated onto the
//! sphere.
//!
//! A polygon that fails to tessellate is logged and skipped; the rest of the
//! collection still renders.

use formats::{PolygonCollection, PolygonFeature};
use foundation::bounds::Aabb3;
use tracing::{debug, info, warn};

use crate::error::TessellationError;
use crate::sphere_mesh::{SphereMesh, TessellationConfig, Tessellator};

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMesh {
    pub label: String,
    pub name: Option<String>,
    /// Every tessellated part of the feature in one mesh.
    pub mesh: SphereMesh,
    pub polygons: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolygonFailure {
    pub feature: String,
    pub polygon: usize,
    pub error: TessellationError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BordersSnapshot {
    pub features: Vec<FeatureMesh>,
    pub failures: Vec<PolygonFailure>,
}

impl BordersSnapshot {
    pub fn triangle_count(&self) -> usize {
        self.features.iter().map(|f| f.mesh.triangle_count()).sum()
    }

    pub fn bounds(&self) -> Option<Aabb3> {
        self.features
            .iter()
            .filter_map(|f| f.mesh.bounds())
            .reduce(Aabb3::union)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BordersLayer {
    tessellator: Tessellator,
}

impl BordersLayer {
    pub fn new(config: TessellationConfig) -> Self {
        Self {
            tessellator: Tessellator::new(config),
        }
    }

    pub fn config(&self) -> &TessellationConfig {
        &self.tessellator.config
    }

    pub fn extract(&self, collection: &PolygonCollection) -> BordersSnapshot {
        let mut out = BordersSnapshot::default();
        for (index, feature) in collection.features.iter().enumerate() {
            let label = feature.label(index);
            let (mesh, polygons) = self.tessellate_feature(&label, feature, &mut out.failures);
            if mesh.is_empty() {
                debug!(feature = %label, "feature produced no triangles");
                continue;
            }
            out.features.push(FeatureMesh {
                label,
                name: feature.name.clone(),
                mesh,
                polygons,
            });
        }

        info!(
            features = out.features.len(),
            triangles = out.triangle_count(),
            failures = out.failures.len(),
            "tessellated borders"
        );
        out
    }

    fn tessellate_feature(
        &self,
        label: &str,
        feature: &PolygonFeature,
        failures: &mut Vec<PolygonFailure>,
    ) -> (SphereMesh, usize) {
        let mut mesh = SphereMesh::new(self.tessellator.config.radius);
        let mut ok = 0;
        for (polygon, rings) in feature.polygons.iter().enumerate() {
            match self.tessellator.tessellate_polygon(rings) {
                Ok(part) => {
                    mesh.append(part);
                    ok += 1;
                }
                Err(error) => {
                    warn!(feature = %label, polygon, %error, "skipping polygon");
                    failures.push(PolygonFailure {
                        feature: label.to_string(),
                        polygon,
                        error,
                    });
                }
            }
        }
        (mesh, ok)
    }
}

#[cfg(test)]
mod tests {
    use super::BordersLayer;
    use crate::sphere_mesh::TessellationConfig;
    use formats::{PolygonCollection, PolygonFeature};
    use foundation::math::GeoPoint;

    fn ring(points: &[(f64, f64)]) -> Vec<GeoPoint> {
        points.iter().map(|&(lon, lat)| GeoPoint::new(lon, lat)).collect()
    }

    fn collection() -> PolygonCollection {
        let square = ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]);
        let triangle = ring(&[(10.0, 10.0), (12.0, 10.0), (11.0, 12.0)]);
        let line = ring(&[(5.0, 5.0), (6.0, 6.0)]);
        PolygonCollection {
            features: vec![
                PolygonFeature {
                    id: Some("A".into()),
                    name: Some("Alpha".into()),
                    polygons: vec![vec![square], vec![line.clone()]],
                },
                PolygonFeature {
                    id: None,
                    name: None,
                    polygons: vec![vec![triangle]],
                },
                PolygonFeature {
                    id: Some("C".into()),
                    name: None,
                    polygons: vec![vec![line]],
                },
            ],
            ..PolygonCollection::default()
        }
    }

    #[test]
    fn bad_polygons_are_isolated() {
        let layer = BordersLayer::new(TessellationConfig {
            radius: 2.0,
            ..TessellationConfig::default()
        });
        let snapshot = layer.extract(&collection());

        let labels: Vec<&str> = snapshot.features.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "#1"]);
        assert_eq!(snapshot.features[0].polygons, 1);

        let failed: Vec<(&str, usize)> = snapshot
            .failures
            .iter()
            .map(|f| (f.feature.as_str(), f.polygon))
            .collect();
        assert_eq!(failed, vec![("A", 1), ("C", 0)]);

        assert!(snapshot.triangle_count() >= 3);
        for feature in &snapshot.features {
            for v in feature.mesh.vertices() {
                assert!((v.length() - 2.0).abs() < 1e-9);
            }
        }
        assert!(snapshot.bounds().is_some());
    }

    #[test]
    fn empty_collection_is_empty() {
        let snapshot = BordersLayer::default().extract(&PolygonCollection::default());
        assert!(snapshot.features.is_empty());
        assert_eq!(snapshot.triangle_count(), 0);
        assert!(snapshot.bounds().is_none());
    }
}
