use foundation::math::GeoPoint;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Polygon rings of one polygon: `[0]` is the outer boundary, the rest are
/// holes.
pub type PolygonRings = Vec<Vec<GeoPoint>>;

#[derive(Debug, Clone, PartialEq)]
pub struct PolygonFeature {
    pub id: Option<String>,
    pub name: Option<String>,
    /// A `Polygon` yields one entry, a `MultiPolygon` one per part.
    pub polygons: Vec<PolygonRings>,
}

impl PolygonFeature {
    /// Id, then name, then the feature's position in the collection.
    pub fn label(&self, index: usize) -> String {
        self.id
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| format!("#{index}"))
    }
}

/// A feature dropped because its geometry could not be read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedFeature {
    /// Position in the source `features` array.
    pub index: usize,
    pub reason: String,
}

/// The polygonal features of a GeoJSON FeatureCollection. Features with any
/// other geometry type are skipped; malformed ones are rejected without
/// affecting the rest.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolygonCollection {
    pub features: Vec<PolygonFeature>,
    pub skipped: usize,
    pub rejected: Vec<RejectedFeature>,
}

#[derive(Debug)]
pub enum PolygonCollectionError {
    Json(String),
    NotAFeatureCollection,
}

impl std::fmt::Display for PolygonCollectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolygonCollectionError::Json(e) => write!(f, "JSON parse error: {e}"),
            PolygonCollectionError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
        }
    }
}

impl std::error::Error for PolygonCollectionError {}

impl PolygonCollection {
    pub fn from_geojson_str(payload: &str) -> Result<Self, PolygonCollectionError> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| PolygonCollectionError::Json(e.to_string()))?;
        Self::from_geojson_value(&value)
    }

    pub fn from_geojson_value(value: &Value) -> Result<Self, PolygonCollectionError> {
        let obj = value
            .as_object()
            .ok_or(PolygonCollectionError::NotAFeatureCollection)?;
        if obj.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
            return Err(PolygonCollectionError::NotAFeatureCollection);
        }
        let features_val = obj
            .get("features")
            .and_then(Value::as_array)
            .ok_or(PolygonCollectionError::NotAFeatureCollection)?;

        let mut out = PolygonCollection::default();
        for (index, feat_val) in features_val.iter().enumerate() {
            match parse_feature(feat_val) {
                Ok(Some(feature)) => out.features.push(feature),
                Ok(None) => {
                    debug!(index, "skipping feature without polygon geometry");
                    out.skipped += 1;
                }
                Err(reason) => {
                    warn!(index, %reason, "rejecting malformed feature");
                    out.rejected.push(RejectedFeature { index, reason });
                }
            }
        }

        Ok(out)
    }

    pub fn polygon_count(&self) -> usize {
        self.features.iter().map(|f| f.polygons.len()).sum()
    }
}

/// `Ok(None)` for features without a Polygon or MultiPolygon geometry.
fn parse_feature(feat_val: &Value) -> Result<Option<PolygonFeature>, String> {
    let feat_obj = feat_val
        .as_object()
        .ok_or("feature must be an object".to_string())?;

    let id = match feat_obj.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    let name = feat_obj
        .get("properties")
        .and_then(Value::as_object)
        .and_then(|props| {
            ["name", "NAME", "ADMIN", "admin"]
                .iter()
                .find_map(|key| props.get(*key).and_then(Value::as_str))
        })
        .map(str::to_string);

    let Some(geometry) = feat_obj.get("geometry").filter(|g| !g.is_null()) else {
        return Ok(None);
    };
    let ty = geometry
        .get("type")
        .and_then(Value::as_str)
        .ok_or("geometry missing type".to_string())?;
    let polygons = match ty {
        "Polygon" => vec![parse_polygon(coordinates(geometry)?)?],
        "MultiPolygon" => parse_multi_polygon(coordinates(geometry)?)?,
        _ => return Ok(None),
    };
    Ok(Some(PolygonFeature { id, name, polygons }))
}

fn coordinates(geometry: &Value) -> Result<&Value, String> {
    geometry
        .get("coordinates")
        .ok_or("geometry missing coordinates".to_string())
}

fn parse_point(coords: &Value) -> Result<GeoPoint, String> {
    let arr = coords
        .as_array()
        .ok_or("position must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("position must have [lon, lat]".to_string());
    }
    let lon = arr[0].as_f64().ok_or("lon must be a number".to_string())?;
    let lat = arr[1].as_f64().ok_or("lat must be a number".to_string())?;
    Ok(GeoPoint::new(lon, lat))
}

fn parse_ring(coords: &Value) -> Result<Vec<GeoPoint>, String> {
    let arr = coords
        .as_array()
        .ok_or("ring must be an array of positions".to_string())?;
    arr.iter().map(parse_point).collect()
}

fn parse_polygon(coords: &Value) -> Result<PolygonRings, String> {
    let rings = coords
        .as_array()
        .ok_or("Polygon coordinates must be an array of rings".to_string())?;
    rings.iter().map(parse_ring).collect()
}

fn parse_multi_polygon(coords: &Value) -> Result<Vec<PolygonRings>, String> {
    let polys = coords
        .as_array()
        .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
    polys.iter().map(parse_polygon).collect()
}

#[cfg(test)]
mod tests {
    use super::{PolygonCollection, PolygonCollectionError, RejectedFeature};
    use foundation::math::GeoPoint;
    use pretty_assertions::assert_eq;

    const COUNTRIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "SQR",
                "properties": { "name": "Square" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 1], [0, 0]]]
                }
            },
            {
                "type": "Feature",
                "id": 7,
                "properties": { "ADMIN": "Islands" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[10, 10], [12, 10], [11, 12], [10, 10]]],
                        [[[20, -5], [22, -5], [21, -3], [20, -5]]]
                    ]
                }
            },
            {
                "type": "Feature",
                "properties": { "name": "Capital" },
                "geometry": { "type": "Point", "coordinates": [3, 4] }
            },
            { "type": "Feature", "properties": {}, "geometry": null }
        ]
    }"#;

    #[test]
    fn parses_polygons_and_multipolygons() {
        let collection = PolygonCollection::from_geojson_str(COUNTRIES).expect("parse");
        assert_eq!(collection.features.len(), 2);
        assert_eq!(collection.skipped, 2);
        assert_eq!(collection.polygon_count(), 3);

        let square = &collection.features[0];
        assert_eq!(square.id.as_deref(), Some("SQR"));
        assert_eq!(square.name.as_deref(), Some("Square"));
        assert_eq!(
            square.polygons[0][0][..2].to_vec(),
            vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0)]
        );

        let islands = &collection.features[1];
        assert_eq!(islands.id.as_deref(), Some("7"));
        assert_eq!(islands.name.as_deref(), Some("Islands"));
        assert_eq!(islands.polygons.len(), 2);
        assert_eq!(islands.label(1), "7");
    }

    #[test]
    fn rejects_non_collections() {
        assert!(matches!(
            PolygonCollection::from_geojson_str(r#"{"type": "Feature"}"#),
            Err(PolygonCollectionError::NotAFeatureCollection)
        ));
        assert!(matches!(
            PolygonCollection::from_geojson_str(r#"{"type": "FeatureCollection"}"#),
            Err(PolygonCollectionError::NotAFeatureCollection)
        ));
        assert!(matches!(
            PolygonCollection::from_geojson_str("not json"),
            Err(PolygonCollectionError::Json(_))
        ));
    }

    #[test]
    fn malformed_features_are_rejected_without_losing_the_rest() {
        let payload = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "id": "SQ",
             "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}},
            {"type": "Feature", "id": "SHORT",
             "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [6]]]}},
            {"type": "Feature",
             "geometry": {"type": "MultiPolygon", "coordinates": [[[["a", 0]]]]}},
            {"type": "Feature", "geometry": {"type": "Polygon"}},
            42
        ]}"#;
        let collection = PolygonCollection::from_geojson_str(payload).expect("parse");
        assert_eq!(collection.features.len(), 1);
        assert_eq!(collection.features[0].id.as_deref(), Some("SQ"));
        assert_eq!(collection.skipped, 0);
        assert_eq!(
            collection.rejected,
            vec![
                RejectedFeature {
                    index: 1,
                    reason: "position must have [lon, lat]".to_string(),
                },
                RejectedFeature {
                    index: 2,
                    reason: "lon must be a number".to_string(),
                },
                RejectedFeature {
                    index: 3,
                    reason: "geometry missing coordinates".to_string(),
                },
                RejectedFeature {
                    index: 4,
                    reason: "feature must be an object".to_string(),
                },
            ]
        );
    }
}
