//! Live vessel and route feeds.
//!
//! Vessel feed: `[{id, lat, lon, heading, speed?, timestamp?}]`, or the same
//! array wrapped as `{"vessels": [...]}`. Route feed:
//! `[{latitude, longitude}]`.

use foundation::math::GeoPoint;
use foundation::time::Time;
use scene::{VesselId, VesselReport};
use serde::Deserialize;

#[derive(Debug)]
pub enum FeedError {
    Json(String),
    InvalidEntry { index: usize, reason: String },
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::Json(e) => write!(f, "feed JSON parse error: {e}"),
            FeedError::InvalidEntry { index, reason } => {
                write!(f, "invalid feed entry at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for FeedError {}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum FeedId {
    Text(String),
    Number(serde_json::Number),
}

impl From<FeedId> for VesselId {
    fn from(id: FeedId) -> Self {
        match id {
            FeedId::Text(s) => VesselId(s),
            FeedId::Number(n) => VesselId(n.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VesselFeedEntry {
    id: FeedId,
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude", alias = "lng")]
    pub lon: f64,
    #[serde(default, alias = "course")]
    pub heading: f64,
    #[serde(default, alias = "sog")]
    pub speed: f64,
    /// Seconds.
    #[serde(default)]
    pub timestamp: Option<f64>,
}

impl VesselFeedEntry {
    pub fn id(&self) -> VesselId {
        self.id.clone().into()
    }

    fn into_report(self, index: usize) -> Result<(VesselId, VesselReport), FeedError> {
        let invalid = |reason: &str| FeedError::InvalidEntry {
            index,
            reason: reason.to_string(),
        };
        if !self.lat.is_finite() || self.lat.abs() > 90.0 {
            return Err(invalid("latitude out of range"));
        }
        if !self.lon.is_finite() {
            return Err(invalid("longitude is not finite"));
        }
        let mut report = VesselReport::new(self.lat, self.lon, self.heading, self.speed);
        if let Some(ts) = self.timestamp {
            report = report.with_timestamp(Time(ts));
        }
        Ok((self.id.into(), report))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VesselFeedDocument {
    Bare(Vec<VesselFeedEntry>),
    Wrapped { vessels: Vec<VesselFeedEntry> },
}

/// Parse one vessel feed snapshot into reports, in feed order.
pub fn parse_vessel_feed(payload: &str) -> Result<Vec<(VesselId, VesselReport)>, FeedError> {
    let document: VesselFeedDocument =
        serde_json::from_str(payload).map_err(|e| FeedError::Json(e.to_string()))?;
    let entries = match document {
        VesselFeedDocument::Bare(entries) => entries,
        VesselFeedDocument::Wrapped { vessels } => vessels,
    };
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| entry.into_report(index))
        .collect()
}

#[derive(Debug, Deserialize)]
struct RouteFeedPoint {
    #[serde(alias = "lat")]
    latitude: f64,
    #[serde(alias = "lon", alias = "lng")]
    longitude: f64,
}

/// Parse a route feed into waypoints.
pub fn parse_route_feed(payload: &str) -> Result<Vec<GeoPoint>, FeedError> {
    let points: Vec<RouteFeedPoint> =
        serde_json::from_str(payload).map_err(|e| FeedError::Json(e.to_string()))?;
    points
        .into_iter()
        .enumerate()
        .map(|(index, p)| {
            let point = GeoPoint::new(p.longitude, p.latitude);
            if point.is_finite() && p.latitude.abs() <= 90.0 {
                Ok(point)
            } else {
                Err(FeedError::InvalidEntry {
                    index,
                    reason: "waypoint out of range".to_string(),
                })
            }
        })
        .collect()
}
